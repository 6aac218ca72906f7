//! Form checks ("cheat detection") for a single pose.
//!
//! Each exercise runs a small set of geometric checks. A check only fires
//! when the keypoints it reads are visible enough; otherwise it abstains and
//! does not contribute to the report confidence.

use crate::error::Result;
use crate::exercise::ExerciseKind;
use crate::landmark::{self, index, LandmarkRecord, Side};
use crate::reps::MIN_VISIBILITY;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Shoulder-hip-ankle angle below which a plank is no longer straight.
const BODY_LINE_MIN: f64 = 160.0;
/// Knees closer than this fraction of ankle width read as caving in.
const VALGUS_RATIO: f64 = 0.75;
const SQUAT_LEAN_MAX: f64 = 50.0;
const LUNGE_LEAN_MAX: f64 = 30.0;
/// Nose-to-shoulder distance relative to torso length.
const NECK_PULL_RATIO: f64 = 0.15;
const KIPPING_HIP_MIN: f64 = 150.0;
const ASYMMETRY_MAX: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    HipSag,
    HipPike,
    KneeValgus,
    ExcessiveForwardLean,
    NeckPulling,
    FeetLifted,
    Kipping,
    Asymmetry,
}

impl Violation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Violation::HipSag => "hip_sag",
            Violation::HipPike => "hip_pike",
            Violation::KneeValgus => "knee_valgus",
            Violation::ExcessiveForwardLean => "excessive_forward_lean",
            Violation::NeckPulling => "neck_pulling",
            Violation::FeetLifted => "feet_lifted",
            Violation::Kipping => "kipping",
            Violation::Asymmetry => "asymmetry",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Violation::KneeValgus => Severity::High,
            Violation::HipSag
            | Violation::ExcessiveForwardLean
            | Violation::NeckPulling
            | Violation::Kipping => Severity::Medium,
            Violation::HipPike | Violation::FeetLifted | Violation::Asymmetry => Severity::Low,
        }
    }

    /// Points taken off form quality.
    pub fn penalty(&self) -> f64 {
        match self {
            Violation::KneeValgus => 25.0,
            Violation::HipSag | Violation::Kipping => 20.0,
            Violation::ExcessiveForwardLean | Violation::NeckPulling => 15.0,
            Violation::HipPike | Violation::FeetLifted | Violation::Asymmetry => 10.0,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Violation::HipSag => "Brace your core and squeeze your glutes to keep hips in line",
            Violation::HipPike => "Lower your hips until shoulders, hips and ankles form a line",
            Violation::KneeValgus => "Push your knees out over your toes",
            Violation::ExcessiveForwardLean => "Keep your chest up and torso more upright",
            Violation::NeckPulling => "Cross your arms over your chest instead of pulling on your neck",
            Violation::FeetLifted => "Keep your feet planted on the floor",
            Violation::Kipping => "Avoid swinging; pull with your arms from a dead hang",
            Violation::Asymmetry => "Move both sides evenly through the full range",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormReport {
    pub violations: Vec<Violation>,
    pub form_quality: f64,
    pub confidence: f64,
    pub recommendations: Vec<String>,
    pub violation_severity: Severity,
}

/// Aggregate over every pose a detector has seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSummary {
    pub frames_analyzed: u64,
    pub average_form_quality: f64,
    pub violation_counts: BTreeMap<Violation, u32>,
}

#[derive(Debug, Clone)]
pub struct FormDetector {
    exercise: ExerciseKind,
    frames_analyzed: u64,
    quality_total: f64,
    violation_counts: BTreeMap<Violation, u32>,
}

#[derive(Default)]
struct Findings {
    violations: Vec<Violation>,
    visibility: Vec<f64>,
}

impl Findings {
    /// Record the visibility a check relied on; false means abstain.
    fn observe(&mut self, visibility: f64) -> bool {
        if visibility < MIN_VISIBILITY {
            return false;
        }
        self.visibility.push(visibility);
        true
    }

    fn flag(&mut self, violation: Violation) {
        if !self.violations.contains(&violation) {
            self.violations.push(violation);
        }
    }
}

impl FormDetector {
    pub fn new(exercise: ExerciseKind) -> Self {
        Self {
            exercise,
            frames_analyzed: 0,
            quality_total: 0.0,
            violation_counts: BTreeMap::new(),
        }
    }

    pub fn analyze_form(&mut self, landmarks: &[LandmarkRecord]) -> Result<FormReport> {
        let mut findings = Findings::default();

        match self.exercise {
            ExerciseKind::Pushup => check_body_line(landmarks, &mut findings)?,
            ExerciseKind::Squat => {
                check_knee_valgus(landmarks, &mut findings)?;
                check_forward_lean(landmarks, SQUAT_LEAN_MAX, &mut findings)?;
            }
            ExerciseKind::Lunge => check_forward_lean(landmarks, LUNGE_LEAN_MAX, &mut findings)?,
            ExerciseKind::Situp => {
                check_neck_pulling(landmarks, &mut findings)?;
                check_feet_lifted(landmarks, &mut findings)?;
            }
            ExerciseKind::Pullup => check_kipping(landmarks, &mut findings)?,
        }
        if self.exercise.is_bilateral() {
            check_asymmetry(self.exercise, landmarks, &mut findings)?;
        }

        let penalty: f64 = findings.violations.iter().map(Violation::penalty).sum();
        let form_quality = (100.0 - penalty).clamp(0.0, 100.0);
        let confidence = if findings.visibility.is_empty() {
            0.0
        } else {
            findings.visibility.iter().sum::<f64>() / findings.visibility.len() as f64
        };
        let violation_severity = findings
            .violations
            .iter()
            .map(Violation::severity)
            .max()
            .unwrap_or(Severity::None);
        let recommendations = if findings.violations.is_empty() {
            vec!["Form looks good, keep it up".to_string()]
        } else {
            findings
                .violations
                .iter()
                .map(|v| v.recommendation().to_string())
                .collect()
        };

        self.frames_analyzed += 1;
        self.quality_total += form_quality;
        for v in &findings.violations {
            *self.violation_counts.entry(*v).or_insert(0) += 1;
        }
        if !findings.violations.is_empty() {
            debug!(
                exercise = %self.exercise,
                violations = ?findings.violations,
                form_quality,
                "form issues"
            );
        }

        Ok(FormReport {
            violations: findings.violations,
            form_quality,
            confidence,
            recommendations,
            violation_severity,
        })
    }

    pub fn summary(&self) -> FormSummary {
        let average_form_quality = if self.frames_analyzed == 0 {
            0.0
        } else {
            self.quality_total / self.frames_analyzed as f64
        };
        FormSummary {
            frames_analyzed: self.frames_analyzed,
            average_form_quality,
            violation_counts: self.violation_counts.clone(),
        }
    }
}

/// Pick the better-seen side for a set of (left, right) keypoint pairs.
fn clearer_side(
    landmarks: &[LandmarkRecord],
    pairs: &[(usize, usize)],
) -> Result<(Side, f64)> {
    let left: Vec<usize> = pairs.iter().map(|p| p.0).collect();
    let right: Vec<usize> = pairs.iter().map(|p| p.1).collect();
    let lv = landmark::mean_visibility(landmarks, &left)?;
    let rv = landmark::mean_visibility(landmarks, &right)?;
    Ok(if rv > lv { (Side::Right, rv) } else { (Side::Left, lv) })
}

fn pick(side: Side, pair: (usize, usize)) -> usize {
    match side {
        Side::Left => pair.0,
        Side::Right => pair.1,
    }
}

const SHOULDER: (usize, usize) = (index::LEFT_SHOULDER, index::RIGHT_SHOULDER);
const HIP: (usize, usize) = (index::LEFT_HIP, index::RIGHT_HIP);
const KNEE: (usize, usize) = (index::LEFT_KNEE, index::RIGHT_KNEE);
const ANKLE: (usize, usize) = (index::LEFT_ANKLE, index::RIGHT_ANKLE);

fn check_body_line(lm: &[LandmarkRecord], findings: &mut Findings) -> Result<()> {
    let (side, vis) = clearer_side(lm, &[SHOULDER, HIP, ANKLE])?;
    if !findings.observe(vis) {
        return Ok(());
    }
    let s = landmark::get(lm, pick(side, SHOULDER))?;
    let h = landmark::get(lm, pick(side, HIP))?;
    let a = landmark::get(lm, pick(side, ANKLE))?;
    if landmark::joint_angle(s, h, a) >= BODY_LINE_MIN {
        return Ok(());
    }
    let span = a.x - s.x;
    if span.abs() < 1e-3 {
        // Body is vertical in frame; not a plank
        return Ok(());
    }
    let t = (h.x - s.x) / span;
    let line_y = s.y + t * (a.y - s.y);
    findings.flag(if h.y > line_y {
        Violation::HipSag
    } else {
        Violation::HipPike
    });
    Ok(())
}

fn check_knee_valgus(lm: &[LandmarkRecord], findings: &mut Findings) -> Result<()> {
    let keys = [KNEE.0, KNEE.1, ANKLE.0, ANKLE.1];
    if !findings.observe(landmark::mean_visibility(lm, &keys)?) {
        return Ok(());
    }
    let knee_width = (landmark::get(lm, KNEE.0)?.x - landmark::get(lm, KNEE.1)?.x).abs();
    let ankle_width = (landmark::get(lm, ANKLE.0)?.x - landmark::get(lm, ANKLE.1)?.x).abs();
    if ankle_width > 0.05 && knee_width < VALGUS_RATIO * ankle_width {
        findings.flag(Violation::KneeValgus);
    }
    Ok(())
}

fn check_forward_lean(
    lm: &[LandmarkRecord],
    max_degrees: f64,
    findings: &mut Findings,
) -> Result<()> {
    let (side, vis) = clearer_side(lm, &[SHOULDER, HIP])?;
    if !findings.observe(vis) {
        return Ok(());
    }
    let s = landmark::get(lm, pick(side, SHOULDER))?;
    let h = landmark::get(lm, pick(side, HIP))?;
    // Degrees from vertical; shoulders level with or below the hips read as >= 90
    let lean = (s.x - h.x).abs().atan2(h.y - s.y).to_degrees();
    if lean > max_degrees {
        findings.flag(Violation::ExcessiveForwardLean);
    }
    Ok(())
}

fn check_neck_pulling(lm: &[LandmarkRecord], findings: &mut Findings) -> Result<()> {
    let keys = [index::NOSE, SHOULDER.0, SHOULDER.1, HIP.0, HIP.1];
    if !findings.observe(landmark::mean_visibility(lm, &keys)?) {
        return Ok(());
    }
    let shoulders = landmark::get(lm, SHOULDER.0)?.midpoint(landmark::get(lm, SHOULDER.1)?);
    let hips = landmark::get(lm, HIP.0)?.midpoint(landmark::get(lm, HIP.1)?);
    let torso = shoulders.distance(&hips);
    if torso < 1e-3 {
        return Ok(());
    }
    let head = landmark::get(lm, index::NOSE)?.distance(&shoulders);
    if head < NECK_PULL_RATIO * torso {
        findings.flag(Violation::NeckPulling);
    }
    Ok(())
}

fn check_feet_lifted(lm: &[LandmarkRecord], findings: &mut Findings) -> Result<()> {
    let (side, vis) = clearer_side(lm, &[KNEE, ANKLE])?;
    if !findings.observe(vis) {
        return Ok(());
    }
    let knee = landmark::get(lm, pick(side, KNEE))?;
    let ankle = landmark::get(lm, pick(side, ANKLE))?;
    if ankle.y < knee.y - 0.02 {
        findings.flag(Violation::FeetLifted);
    }
    Ok(())
}

fn check_kipping(lm: &[LandmarkRecord], findings: &mut Findings) -> Result<()> {
    let (side, vis) = clearer_side(lm, &[SHOULDER, HIP, KNEE])?;
    if !findings.observe(vis) {
        return Ok(());
    }
    let angle = landmark::triplet_angle(
        lm,
        [pick(side, SHOULDER), pick(side, HIP), pick(side, KNEE)],
    )?;
    if angle < KIPPING_HIP_MIN {
        findings.flag(Violation::Kipping);
    }
    Ok(())
}

fn check_asymmetry(
    exercise: ExerciseKind,
    lm: &[LandmarkRecord],
    findings: &mut Findings,
) -> Result<()> {
    let joint = exercise.profile().joint;
    let left = joint.triplet(Side::Left);
    let right = joint.triplet(Side::Right);
    let vis = landmark::mean_visibility(lm, &left)?.min(landmark::mean_visibility(lm, &right)?);
    if !findings.observe(vis) {
        return Ok(());
    }
    let diff = (landmark::triplet_angle(lm, left)? - landmark::triplet_angle(lm, right)?).abs();
    if diff > ASYMMETRY_MAX {
        findings.flag(Violation::Asymmetry);
    }
    Ok(())
}
