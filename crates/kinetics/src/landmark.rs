//! Pose landmarks and joint geometry.
//!
//! Landmark sequences are positional: index `i` is always the same body
//! keypoint, following the 33-point BlazePose skeleton. Coordinates are
//! normalized image coordinates (x right, y down) with a relative depth `z`.

use crate::error::{KineticsError, Result};
use serde::{Deserialize, Serialize};

/// Number of keypoints in a full skeleton.
pub const SKELETON_LEN: usize = 33;

/// Keypoint indices used by the analyzers.
pub mod index {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
}

/// One tracked keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Detector confidence that the keypoint is visible, 0..1.
    pub visibility: f64,
}

impl LandmarkRecord {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
            && self.visibility.is_finite()
    }

    /// Planar distance to another keypoint.
    pub fn distance(&self, other: &LandmarkRecord) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Planar midpoint; visibility is the lower of the two.
    pub fn midpoint(&self, other: &LandmarkRecord) -> LandmarkRecord {
        LandmarkRecord {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
            visibility: self.visibility.min(other.visibility),
        }
    }
}

/// Body side for paired joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Fetch keypoint `index`, rejecting short or corrupt poses.
pub fn get(landmarks: &[LandmarkRecord], index: usize) -> Result<&LandmarkRecord> {
    let lm = landmarks.get(index).ok_or(KineticsError::MissingLandmark {
        index,
        available: landmarks.len(),
    })?;
    if !lm.is_finite() {
        return Err(KineticsError::NonFiniteLandmark { index });
    }
    Ok(lm)
}

/// Interior angle at `b` formed by `a-b-c`, in degrees (0..=180).
pub fn joint_angle(a: &LandmarkRecord, b: &LandmarkRecord, c: &LandmarkRecord) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let mut degrees = radians.to_degrees().abs();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    degrees
}

/// Angle of a triplet of keypoint indices.
pub fn triplet_angle(landmarks: &[LandmarkRecord], triplet: [usize; 3]) -> Result<f64> {
    let a = get(landmarks, triplet[0])?;
    let b = get(landmarks, triplet[1])?;
    let c = get(landmarks, triplet[2])?;
    Ok(joint_angle(a, b, c))
}

/// Mean visibility over the given keypoints.
pub fn mean_visibility(landmarks: &[LandmarkRecord], indices: &[usize]) -> Result<f64> {
    if indices.is_empty() {
        return Ok(0.0);
    }
    let mut total = 0.0;
    for &i in indices {
        total += get(landmarks, i)?.visibility;
    }
    Ok(total / indices.len() as f64)
}
