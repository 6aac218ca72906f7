//! Rep counting from a stream of poses.
//!
//! The counter tracks one joint angle per exercise, picks whichever body
//! side the detector sees better, smooths over a short window and runs a
//! two-threshold state machine. A rep is credited on the flexed-to-extended
//! transition, so a partial range of motion never counts.

use crate::error::Result;
use crate::exercise::{ExerciseKind, RepProfile};
use crate::landmark::{self, LandmarkRecord, Side};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::trace;

/// Frames below this joint visibility leave the state machine untouched.
pub const MIN_VISIBILITY: f64 = 0.5;

const SMOOTHING_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPhase {
    Unknown,
    Extended,
    Flexed,
}

/// Result of feeding one pose to the counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepUpdate {
    pub rep_count: u32,
    pub current_state: String,
    pub confidence: f64,
    pub angle: f64,
    pub debug_info: String,
}

#[derive(Debug, Clone)]
pub struct RepCounter {
    exercise: ExerciseKind,
    profile: RepProfile,
    phase: MotionPhase,
    reps: u32,
    window: VecDeque<f64>,
    frames: u64,
}

impl RepCounter {
    pub fn new(exercise: ExerciseKind) -> Self {
        Self {
            exercise,
            profile: exercise.profile(),
            phase: MotionPhase::Unknown,
            reps: 0,
            window: VecDeque::with_capacity(SMOOTHING_WINDOW),
            frames: 0,
        }
    }

    pub fn rep_count(&self) -> u32 {
        self.reps
    }

    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// Poses fed so far, including low-visibility ones.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn update(&mut self, landmarks: &[LandmarkRecord]) -> Result<RepUpdate> {
        self.frames += 1;

        let (side, visibility) = self.best_side(landmarks)?;
        if visibility < MIN_VISIBILITY {
            trace!(exercise = %self.exercise, visibility, "pose too faint, holding state");
            return Ok(self.report(
                visibility,
                self.smoothed(),
                format!(
                    "{} visibility {:.2} below {:.2}; state held",
                    self.profile.joint.as_str(),
                    visibility,
                    MIN_VISIBILITY
                ),
            ));
        }

        let raw = landmark::triplet_angle(landmarks, self.profile.joint.triplet(side))?;
        if self.window.len() == SMOOTHING_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(raw);
        let angle = self.smoothed();

        let before = self.phase;
        self.phase = match self.phase {
            MotionPhase::Unknown if angle <= self.profile.flexed_below => MotionPhase::Flexed,
            MotionPhase::Unknown if angle >= self.profile.extended_above => MotionPhase::Extended,
            MotionPhase::Extended if angle <= self.profile.flexed_below => MotionPhase::Flexed,
            MotionPhase::Flexed if angle >= self.profile.extended_above => {
                self.reps += 1;
                MotionPhase::Extended
            }
            phase => phase,
        };
        if before != self.phase {
            trace!(
                exercise = %self.exercise,
                ?before,
                after = ?self.phase,
                reps = self.reps,
                angle,
                "phase change"
            );
        }

        Ok(self.report(
            visibility,
            angle,
            format!(
                "{} {} angle {:.1} (raw {:.1}), thresholds {:.0}/{:.0}",
                side.as_str(),
                self.profile.joint.as_str(),
                angle,
                raw,
                self.profile.flexed_below,
                self.profile.extended_above
            ),
        ))
    }

    fn best_side(&self, landmarks: &[LandmarkRecord]) -> Result<(Side, f64)> {
        let joint = self.profile.joint;
        let left = landmark::mean_visibility(landmarks, &joint.triplet(Side::Left))?;
        let right = landmark::mean_visibility(landmarks, &joint.triplet(Side::Right))?;
        Ok(if right > left {
            (Side::Right, right)
        } else {
            (Side::Left, left)
        })
    }

    fn smoothed(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    fn state_label(&self) -> &'static str {
        match self.phase {
            MotionPhase::Unknown => "ready",
            MotionPhase::Extended => self.profile.extended_label,
            MotionPhase::Flexed => self.profile.flexed_label,
        }
    }

    fn report(&self, confidence: f64, angle: f64, debug_info: String) -> RepUpdate {
        RepUpdate {
            rep_count: self.reps,
            current_state: self.state_label().to_string(),
            confidence,
            angle,
            debug_info,
        }
    }
}
