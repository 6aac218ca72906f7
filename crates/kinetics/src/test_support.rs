//! Synthetic skeletons for analyzer tests.

use crate::landmark::{index, LandmarkRecord, SKELETON_LEN};

/// Neutral full-visibility pose with every keypoint at the frame center.
pub(crate) fn blank_pose() -> Vec<LandmarkRecord> {
    vec![LandmarkRecord::new(0.5, 0.5, 0.0, 1.0); SKELETON_LEN]
}

/// Place `c` so that the angle `a-b-c` equals `degrees`, `b` fixed at
/// `origin` and `a` straight above it.
pub(crate) fn bend(
    pose: &mut [LandmarkRecord],
    [a, b, c]: [usize; 3],
    origin: (f64, f64),
    degrees: f64,
) {
    let len = 0.2;
    pose[a].x = origin.0;
    pose[a].y = origin.1 - len;
    pose[b].x = origin.0;
    pose[b].y = origin.1;
    let phi = (-90.0 + degrees).to_radians();
    pose[c].x = origin.0 + len * phi.cos();
    pose[c].y = origin.1 + len * phi.sin();
}

/// Both elbows bent to `degrees`.
pub(crate) fn elbows_at(degrees: f64) -> Vec<LandmarkRecord> {
    let mut pose = blank_pose();
    bend(
        &mut pose,
        [index::LEFT_SHOULDER, index::LEFT_ELBOW, index::LEFT_WRIST],
        (0.4, 0.5),
        degrees,
    );
    bend(
        &mut pose,
        [index::RIGHT_SHOULDER, index::RIGHT_ELBOW, index::RIGHT_WRIST],
        (0.6, 0.5),
        degrees,
    );
    pose
}

/// Both knees bent to `degrees`.
pub(crate) fn knees_at(degrees: f64) -> Vec<LandmarkRecord> {
    let mut pose = blank_pose();
    bend(
        &mut pose,
        [index::LEFT_HIP, index::LEFT_KNEE, index::LEFT_ANKLE],
        (0.4, 0.7),
        degrees,
    );
    bend(
        &mut pose,
        [index::RIGHT_HIP, index::RIGHT_KNEE, index::RIGHT_ANKLE],
        (0.6, 0.7),
        degrees,
    );
    pose
}

pub(crate) fn with_visibility(
    mut pose: Vec<LandmarkRecord>,
    visibility: f64,
) -> Vec<LandmarkRecord> {
    for lm in &mut pose {
        lm.visibility = visibility;
    }
    pose
}
