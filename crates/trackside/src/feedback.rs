//! Spoken coaching cues from the latest metrics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrentMetrics {
    pub rep_count: i64,
    pub form_quality: f64,
    pub violations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceFeedback {
    pub feedback_text: String,
    pub priority: Priority,
}

/// First matching rule wins: form violations, then low quality, then
/// milestones every five reps.
pub fn voice_feedback(metrics: &CurrentMetrics) -> VoiceFeedback {
    let (feedback_text, priority) = if let Some(first) = metrics.violations.first() {
        (format!("Focus on form - {first} detected"), Priority::High)
    } else if metrics.form_quality < 70.0 {
        ("Maintain better form throughout the movement".to_string(), Priority::Medium)
    } else if metrics.rep_count > 0 && metrics.rep_count % 5 == 0 {
        (format!("Great job! {} reps completed", metrics.rep_count), Priority::Low)
    } else {
        ("Keep going, you're doing great!".to_string(), Priority::Low)
    };
    VoiceFeedback {
        feedback_text,
        priority,
    }
}
