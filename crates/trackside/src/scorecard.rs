//! Placeholder scorecard.
//!
//! The score is a configured baseline plus uniform integer jitter. It does
//! not look at the athlete's data; responses carry `placeholder: true` so
//! clients can tell.

use rand::Rng;
use serde::Serialize;
use trackconf::ScorecardConfig;

const PERCENTILE_JITTER: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub score: f64,
    pub percentile: f64,
    pub analysis: String,
    pub metrics: ScoreMetrics,
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreMetrics {
    pub consistency: f64,
    pub efficiency: f64,
    pub power: f64,
    pub endurance: f64,
}

#[derive(Debug, Clone)]
pub struct PlaceholderScorer {
    baseline: f64,
    jitter: i64,
}

impl PlaceholderScorer {
    pub fn new(cfg: &ScorecardConfig) -> Self {
        Self {
            baseline: cfg.baseline,
            jitter: cfg.jitter.max(0),
        }
    }

    pub fn score(&self, exercise_type: &str) -> Scorecard {
        self.score_with(&mut rand::rng(), exercise_type)
    }

    pub fn score_with<R: Rng + ?Sized>(&self, rng: &mut R, exercise_type: &str) -> Scorecard {
        let score = self.baseline + offset(rng, self.jitter) as f64;
        let percentile = (score + offset(rng, PERCENTILE_JITTER) as f64).min(99.0);

        Scorecard {
            score,
            percentile: (percentile * 10.0).round() / 10.0,
            analysis: format!("AI-analyzed performance for {exercise_type}"),
            metrics: ScoreMetrics {
                consistency: score * 0.9,
                efficiency: score * 0.85,
                power: score * 0.95,
                endurance: score * 0.8,
            },
            placeholder: true,
        }
    }
}

/// Uniform integer in `[-half, half)`; zero when the window is empty.
fn offset<R: Rng + ?Sized>(rng: &mut R, half: i64) -> i64 {
    if half <= 0 {
        0
    } else {
        rng.random_range(-half..half)
    }
}
