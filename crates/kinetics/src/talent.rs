//! Talent identification from a performance summary.
//!
//! The weighted model blends whichever metrics the caller supplies into a
//! composite 0..100 score, places it against a reference population and
//! projects growth from age and learning rate.

use crate::error::{KineticsError, Result};
use crate::stats::{percentile, round1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw performance summary. Every field is optional; absent metrics are
/// left out of the blend rather than treated as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceData {
    pub exercise_type: Option<String>,
    pub reps_per_minute: Option<f64>,
    pub form_quality: Option<f64>,
    pub consistency_score: Option<f64>,
    pub endurance_score: Option<f64>,
    pub power_output: Option<f64>,
    pub learning_rate_score: Option<f64>,
    pub age: Option<u32>,
    pub training_years: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TalentReport {
    pub talent_profile: TalentProfile,
    pub future_potential: FuturePotential,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TalentProfile {
    pub composite_talent_score: f64,
    pub talent_category: TalentCategory,
    pub component_scores: BTreeMap<&'static str, f64>,
    pub development_recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TalentCategory {
    pub category: &'static str,
    pub description: &'static str,
    pub percentile: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuturePotential {
    pub growth_rate: f64,
    pub potential_predictions: PotentialPredictions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PotentialPredictions {
    #[serde(rename = "6_months")]
    pub six_months: f64,
    #[serde(rename = "1_year")]
    pub one_year: f64,
    #[serde(rename = "2_years")]
    pub two_years: f64,
}

pub trait TalentPredictor: Send + Sync {
    fn generate_talent_report(&self, data: &PerformanceData) -> Result<TalentReport>;
}

/// Score assumed when no metric is supplied at all.
const NEUTRAL_SCORE: f64 = 50.0;
const POPULATION_MEAN: f64 = 60.0;
const POPULATION_STD: f64 = 15.0;
/// Reps per minute that maps to a full work-rate score.
const FULL_WORK_RATE: f64 = 40.0;
/// Components below this are called out in recommendations.
const WEAK_COMPONENT: f64 = 75.0;

#[derive(Debug, Clone)]
pub struct WeightedTalentModel {
    weights: [(&'static str, f64); 6],
}

impl Default for WeightedTalentModel {
    fn default() -> Self {
        Self {
            weights: [
                ("form_quality", 0.25),
                ("consistency", 0.20),
                ("endurance", 0.15),
                ("power", 0.15),
                ("learning_rate", 0.15),
                ("work_rate", 0.10),
            ],
        }
    }
}

impl WeightedTalentModel {
    fn components(data: &PerformanceData) -> Result<BTreeMap<&'static str, f64>> {
        let mut out = BTreeMap::new();
        let direct = [
            ("form_quality", data.form_quality),
            ("consistency", data.consistency_score),
            ("endurance", data.endurance_score),
            ("power", data.power_output),
            ("learning_rate", data.learning_rate_score),
        ];
        for (name, value) in direct {
            if let Some(v) = value {
                out.insert(name, checked(name, v)?.min(100.0));
            }
        }
        if let Some(rpm) = data.reps_per_minute {
            let rpm = checked("reps_per_minute", rpm)?;
            out.insert("work_rate", (rpm / FULL_WORK_RATE * 100.0).min(100.0));
        }
        Ok(out)
    }

    fn composite(&self, components: &BTreeMap<&'static str, f64>) -> f64 {
        let (sum, weight) = self
            .weights
            .iter()
            .filter_map(|(name, w)| components.get(name).map(|v| (v * w, *w)))
            .fold((0.0, 0.0), |(s, tw), (v, w)| (s + v, tw + w));
        if weight == 0.0 {
            NEUTRAL_SCORE
        } else {
            sum / weight
        }
    }
}

impl TalentPredictor for WeightedTalentModel {
    fn generate_talent_report(&self, data: &PerformanceData) -> Result<TalentReport> {
        let components = Self::components(data)?;
        let experience = match data.training_years {
            Some(years) => experience_headroom(checked("training_years", years)?),
            None => 1.0,
        };
        let score = round1(self.composite(&components));
        let (category, description) = categorize(score);

        let learning = components.get("learning_rate").copied().unwrap_or(75.0);
        let growth_rate =
            round1(age_growth(data.age) * experience * (learning / 75.0) * 100.0) / 100.0;
        let project = |months: f64| {
            let gain = (100.0 - score) * (1.0 - (-growth_rate * months / 12.0).exp());
            round1((score + gain).min(100.0))
        };

        Ok(TalentReport {
            talent_profile: TalentProfile {
                composite_talent_score: score,
                talent_category: TalentCategory {
                    category,
                    description,
                    percentile: percentile(score, POPULATION_MEAN, POPULATION_STD),
                },
                development_recommendations: recommendations(&components, data),
                component_scores: components,
            },
            future_potential: FuturePotential {
                growth_rate,
                potential_predictions: PotentialPredictions {
                    six_months: project(6.0),
                    one_year: project(12.0),
                    two_years: project(24.0),
                },
            },
        })
    }
}

fn checked(name: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(KineticsError::InvalidMetric { name, value });
    }
    Ok(value)
}

fn categorize(score: f64) -> (&'static str, &'static str) {
    match score {
        s if s >= 90.0 => ("Elite Prospect", "Exceptional ability; ready for specialist coaching"),
        s if s >= 80.0 => ("High Potential", "Strong all-round profile with clear upside"),
        s if s >= 65.0 => ("Developing Talent", "Solid base with specific areas to build"),
        s if s >= 50.0 => ("Emerging", "Promising start; consistency will unlock progress"),
        _ => ("Foundational", "Focus on fundamentals and regular practice"),
    }
}

/// Annual growth factor by age; younger athletes improve faster.
fn age_growth(age: Option<u32>) -> f64 {
    match age {
        Some(a) if a <= 16 => 0.45,
        Some(a) if a <= 20 => 0.35,
        Some(a) if a <= 25 => 0.25,
        Some(_) => 0.15,
        None => 0.25,
    }
}

/// Growth multiplier from training history; gains slow as years accumulate.
fn experience_headroom(training_years: f64) -> f64 {
    1.0 - training_years.min(10.0) / 20.0
}

fn recommendations(
    components: &BTreeMap<&'static str, f64>,
    data: &PerformanceData,
) -> Vec<String> {
    let mut weak: Vec<(&'static str, f64)> = components
        .iter()
        .filter(|(_, v)| **v < WEAK_COMPONENT)
        .map(|(k, v)| (*k, *v))
        .collect();
    weak.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut out: Vec<String> = weak
        .into_iter()
        .map(|(name, _)| {
            match name {
                "form_quality" => "Prioritise technique drills with video review",
                "consistency" => "Hold a steady tempo across every set",
                "endurance" => "Add progressive volume and aerobic conditioning",
                "power" => "Include explosive and strength-focused sessions",
                "learning_rate" => "Break movements into simpler progressions",
                _ => "Build work capacity with timed sets",
            }
            .to_string()
        })
        .collect();

    if out.is_empty() {
        out.push("Maintain current training load and reassess monthly".to_string());
    }
    if let Some(exercise) = data.exercise_type.as_deref() {
        out.push(format!("Track {exercise} sessions to measure week-on-week change"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong() -> PerformanceData {
        PerformanceData {
            exercise_type: Some("pushup".into()),
            reps_per_minute: Some(40.0),
            form_quality: Some(95.0),
            consistency_score: Some(92.0),
            endurance_score: Some(90.0),
            power_output: Some(91.0),
            learning_rate_score: Some(94.0),
            age: Some(17),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_data_is_neutral() {
        let report = WeightedTalentModel::default()
            .generate_talent_report(&PerformanceData::default())
            .unwrap();
        assert_eq!(report.talent_profile.composite_talent_score, 50.0);
        assert_eq!(report.talent_profile.talent_category.category, "Emerging");
        assert!(!report.talent_profile.development_recommendations.is_empty());
    }

    #[test]
    fn test_strong_profile_is_elite() {
        let report = WeightedTalentModel::default().generate_talent_report(&strong()).unwrap();
        let profile = &report.talent_profile;
        assert!(profile.composite_talent_score >= 90.0);
        assert_eq!(profile.talent_category.category, "Elite Prospect");
        assert!(profile.talent_category.percentile >= 95);
    }

    #[test]
    fn test_predictions_are_monotonic_and_capped() {
        let report = WeightedTalentModel::default().generate_talent_report(&strong()).unwrap();
        let score = report.talent_profile.composite_talent_score;
        let p = &report.future_potential.potential_predictions;
        assert!(score <= p.six_months);
        assert!(p.six_months <= p.one_year);
        assert!(p.one_year <= p.two_years);
        assert!(p.two_years <= 100.0);
    }

    #[test]
    fn test_younger_grows_faster() {
        let model = WeightedTalentModel::default();
        let mut data = strong();
        data.age = Some(15);
        let young = model.generate_talent_report(&data).unwrap();
        data.age = Some(30);
        let older = model.generate_talent_report(&data).unwrap();
        assert!(young.future_potential.growth_rate > older.future_potential.growth_rate);
    }

    #[test]
    fn test_training_years_slow_growth() {
        let model = WeightedTalentModel::default();
        let mut data = strong();
        let unknown = model.generate_talent_report(&data).unwrap();
        data.training_years = Some(1.0);
        let novice = model.generate_talent_report(&data).unwrap();
        data.training_years = Some(12.0);
        let veteran = model.generate_talent_report(&data).unwrap();

        let rate = |r: &TalentReport| r.future_potential.growth_rate;
        assert!(rate(&novice) <= rate(&unknown));
        assert!(rate(&veteran) < rate(&novice));
        // Composite is about current ability only
        assert_eq!(
            novice.talent_profile.composite_talent_score,
            veteran.talent_profile.composite_talent_score
        );
    }

    #[test]
    fn test_rejects_negative_training_years() {
        let data = PerformanceData {
            training_years: Some(-1.0),
            ..Default::default()
        };
        let err = WeightedTalentModel::default().generate_talent_report(&data).unwrap_err();
        assert_eq!(err, KineticsError::InvalidMetric { name: "training_years", value: -1.0 });
    }

    #[test]
    fn test_weakest_component_first() {
        let data = PerformanceData {
            form_quality: Some(90.0),
            endurance_score: Some(40.0),
            power_output: Some(60.0),
            ..Default::default()
        };
        let report = WeightedTalentModel::default().generate_talent_report(&data).unwrap();
        let recs = &report.talent_profile.development_recommendations;
        assert_eq!(recs.len(), 2);
        assert!(recs[0].contains("aerobic"));
        assert!(recs[1].contains("explosive"));
    }

    #[test]
    fn test_rejects_negative_metric() {
        let data = PerformanceData {
            power_output: Some(-3.0),
            ..Default::default()
        };
        let err = WeightedTalentModel::default().generate_talent_report(&data).unwrap_err();
        assert_eq!(err, KineticsError::InvalidMetric { name: "power", value: -3.0 });
    }

    #[test]
    fn test_wire_shape() {
        let data: PerformanceData =
            serde_json::from_str(r#"{"form_quality": 70, "exercise_type": "squat"}"#).unwrap();
        let report = WeightedTalentModel::default().generate_talent_report(&data).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["talent_profile"]["composite_talent_score"], 70.0);
        assert!(json["future_potential"]["potential_predictions"]["6_months"].is_number());
        assert!(json["future_potential"]["potential_predictions"]["2_years"].is_number());
    }
}
