//! Error types for exercise analysis.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KineticsError {
    #[error("Unknown exercise type: {0}")]
    UnknownExercise(String),

    #[error("Landmark {index} missing: pose has {available} landmarks")]
    MissingLandmark { index: usize, available: usize },

    #[error("Landmark {index} has non-finite coordinates")]
    NonFiniteLandmark { index: usize },

    #[error("Invalid metric {name}: {value}")]
    InvalidMetric { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, KineticsError>;
