//! Supported exercises and their rep-counting geometry.

use crate::error::KineticsError;
use crate::landmark::{index, Side};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    Pushup,
    Situp,
    Squat,
    Pullup,
    Lunge,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 5] = [
        ExerciseKind::Pushup,
        ExerciseKind::Situp,
        ExerciseKind::Squat,
        ExerciseKind::Pullup,
        ExerciseKind::Lunge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Pushup => "pushup",
            ExerciseKind::Situp => "situp",
            ExerciseKind::Squat => "squat",
            ExerciseKind::Pullup => "pullup",
            ExerciseKind::Lunge => "lunge",
        }
    }

    pub fn profile(&self) -> RepProfile {
        match self {
            ExerciseKind::Pushup => RepProfile {
                joint: Joint::Elbow,
                flexed_below: 90.0,
                extended_above: 155.0,
                extended_label: "up",
                flexed_label: "down",
            },
            ExerciseKind::Squat => RepProfile {
                joint: Joint::Knee,
                flexed_below: 100.0,
                extended_above: 160.0,
                extended_label: "up",
                flexed_label: "down",
            },
            ExerciseKind::Situp => RepProfile {
                joint: Joint::Hip,
                flexed_below: 70.0,
                extended_above: 120.0,
                extended_label: "down",
                flexed_label: "up",
            },
            ExerciseKind::Pullup => RepProfile {
                joint: Joint::Elbow,
                flexed_below: 70.0,
                extended_above: 150.0,
                extended_label: "down",
                flexed_label: "up",
            },
            ExerciseKind::Lunge => RepProfile {
                joint: Joint::Knee,
                flexed_below: 100.0,
                extended_above: 160.0,
                extended_label: "up",
                flexed_label: "down",
            },
        }
    }

    /// Whether left and right should move together.
    pub fn is_bilateral(&self) -> bool {
        !matches!(self, ExerciseKind::Lunge)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = KineticsError;

    /// Case-insensitive; `push-up`, `push_up` and `pushups` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let singular = normalized.strip_suffix('s').unwrap_or(&normalized);
        match singular {
            "pushup" => Ok(ExerciseKind::Pushup),
            "situp" => Ok(ExerciseKind::Situp),
            "squat" => Ok(ExerciseKind::Squat),
            "pullup" => Ok(ExerciseKind::Pullup),
            "lunge" => Ok(ExerciseKind::Lunge),
            _ => Err(KineticsError::UnknownExercise(s.to_string())),
        }
    }
}

/// The joint whose angle drives rep counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Joint {
    /// shoulder-elbow-wrist
    Elbow,
    /// hip-knee-ankle
    Knee,
    /// shoulder-hip-knee
    Hip,
}

impl Joint {
    pub fn triplet(&self, side: Side) -> [usize; 3] {
        use index::*;
        match (self, side) {
            (Joint::Elbow, Side::Left) => [LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST],
            (Joint::Elbow, Side::Right) => [RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST],
            (Joint::Knee, Side::Left) => [LEFT_HIP, LEFT_KNEE, LEFT_ANKLE],
            (Joint::Knee, Side::Right) => [RIGHT_HIP, RIGHT_KNEE, RIGHT_ANKLE],
            (Joint::Hip, Side::Left) => [LEFT_SHOULDER, LEFT_HIP, LEFT_KNEE],
            (Joint::Hip, Side::Right) => [RIGHT_SHOULDER, RIGHT_HIP, RIGHT_KNEE],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Joint::Elbow => "elbow",
            Joint::Knee => "knee",
            Joint::Hip => "hip",
        }
    }
}

/// Angle thresholds with hysteresis: a rep is one flexed-to-extended cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepProfile {
    pub joint: Joint,
    pub flexed_below: f64,
    pub extended_above: f64,
    pub extended_label: &'static str,
    pub flexed_label: &'static str,
}
