//! Olympic readiness assessment for an athlete profile.

use crate::error::{KineticsError, Result};
use crate::stats::{percentile, round1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub primary_exercise: String,
    pub training_years: f64,
    pub reps_per_minute: f64,
    pub average_form_quality: f64,
    pub consistency_score: f64,
    pub endurance_score: f64,
    pub power_output: f64,
    pub learning_rate_score: f64,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            name: "SIH Athlete".to_string(),
            age: 25,
            gender: "male".to_string(),
            primary_exercise: "pushup".to_string(),
            training_years: 3.0,
            reps_per_minute: 30.0,
            average_form_quality: 80.0,
            consistency_score: 85.0,
            endurance_score: 75.0,
            power_output: 70.0,
            learning_rate_score: 85.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadinessReport {
    pub athlete: String,
    pub readiness_score: f64,
    pub category: &'static str,
    pub description: &'static str,
    pub percentile: u8,
    pub key_indicators: Vec<&'static str>,
    pub development_path: Vec<&'static str>,
}

pub trait ReadinessPredictor: Send + Sync {
    fn generate_assessment_report(&self, profile: &AthleteProfile) -> Result<ReadinessReport>;
}

const POPULATION_MEAN: f64 = 65.0;
const POPULATION_STD: f64 = 12.0;
/// Years of structured training treated as fully experienced.
const FULL_EXPERIENCE_YEARS: f64 = 8.0;
const FULL_WORK_RATE: f64 = 40.0;

#[derive(Debug, Clone, Default)]
pub struct WeightedReadinessModel;

struct Indicator {
    name: &'static str,
    step: &'static str,
    weight: f64,
    value: f64,
}

impl WeightedReadinessModel {
    fn indicators(p: &AthleteProfile) -> Result<Vec<Indicator>> {
        let metric = |name: &'static str, value: f64| -> Result<f64> {
            if !value.is_finite() || value < 0.0 {
                return Err(KineticsError::InvalidMetric { name, value });
            }
            Ok(value.min(100.0))
        };
        let experience = metric("training_years", p.training_years)?;
        let rpm = metric("reps_per_minute", p.reps_per_minute)?;
        Ok(vec![
            Indicator {
                name: "Form Quality",
                step: "Technique Refinement",
                weight: 0.20,
                value: metric("average_form_quality", p.average_form_quality)?,
            },
            Indicator {
                name: "Consistency",
                step: "Structured Training Blocks",
                weight: 0.20,
                value: metric("consistency_score", p.consistency_score)?,
            },
            Indicator {
                name: "Endurance",
                step: "Aerobic Base Building",
                weight: 0.15,
                value: metric("endurance_score", p.endurance_score)?,
            },
            Indicator {
                name: "Power",
                step: "Strength Training",
                weight: 0.15,
                value: metric("power_output", p.power_output)?,
            },
            Indicator {
                name: "Learning Rate",
                step: "Skill Acquisition Drills",
                weight: 0.10,
                value: metric("learning_rate_score", p.learning_rate_score)?,
            },
            Indicator {
                name: "Training Experience",
                step: "Competition Exposure",
                weight: 0.10,
                value: (experience / FULL_EXPERIENCE_YEARS * 100.0).min(100.0),
            },
            Indicator {
                name: "Work Rate",
                step: "Tempo Work",
                weight: 0.10,
                value: (rpm / FULL_WORK_RATE * 100.0).min(100.0),
            },
        ])
    }
}

impl ReadinessPredictor for WeightedReadinessModel {
    fn generate_assessment_report(&self, profile: &AthleteProfile) -> Result<ReadinessReport> {
        let indicators = Self::indicators(profile)?;
        let mut score: f64 = indicators.iter().map(|i| i.weight * i.value).sum();
        // Outside the typical competitive age band
        if profile.age < 16 || profile.age > 35 {
            score *= 0.95;
        }
        let score = round1(score);
        let (category, description) = categorize(score);

        let mut ranked: Vec<&Indicator> = indicators.iter().collect();
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
        let key_indicators = ranked.iter().take(3).map(|i| i.name).collect();
        let development_path = ranked.iter().rev().take(2).map(|i| i.step).collect();

        Ok(ReadinessReport {
            athlete: profile.name.clone(),
            readiness_score: score,
            category,
            description,
            percentile: percentile(score, POPULATION_MEAN, POPULATION_STD),
            key_indicators,
            development_path,
        })
    }
}

fn categorize(score: f64) -> (&'static str, &'static str) {
    match score {
        s if s >= 90.0 => ("Olympic Ready", "Competitive at international level"),
        s if s >= 80.0 => ("National Level", "Ready for national selection events"),
        s if s >= 70.0 => ("Developing", "On track; targeted work will close the gap"),
        s if s >= 55.0 => ("Emerging", "Building the base for competitive sport"),
        _ => ("Grassroots", "Early stage; focus on fundamentals"),
    }
}
