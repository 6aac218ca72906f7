//! kinetics - exercise analysis over pose landmarks.
//!
//! Everything here is synchronous and deterministic. The HTTP layer owns
//! scheduling and session bookkeeping; this crate only answers "what does
//! this frame (or this athlete summary) look like".
//!
//! - [`landmark`]: the 33-point skeleton record and joint geometry
//! - [`exercise`]: supported exercises and their rep thresholds
//! - [`reps`]: per-session rep counter state machine
//! - [`form`]: per-session form (cheat) detector
//! - [`talent`] / [`readiness`]: stateless athlete scoring models

pub mod error;
pub mod exercise;
pub mod form;
pub mod landmark;
pub mod readiness;
pub mod reps;
pub mod talent;

mod stats;

pub use error::{KineticsError, Result};
pub use exercise::{ExerciseKind, Joint, RepProfile};
pub use form::{FormDetector, FormReport, Severity, Violation};
pub use landmark::{LandmarkRecord, Side, SKELETON_LEN};
pub use readiness::{AthleteProfile, ReadinessPredictor, ReadinessReport, WeightedReadinessModel};
pub use reps::{MotionPhase, RepCounter, RepUpdate};
pub use talent::{PerformanceData, TalentPredictor, TalentReport, WeightedTalentModel};

#[cfg(test)]
pub(crate) mod test_support;
