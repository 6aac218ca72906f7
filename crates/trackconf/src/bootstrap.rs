//! Bootstrap configuration - collaborator endpoints and launch settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Model service endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Base URL of the pose estimation service. Unset disables pose detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_url: Option<String>,

    /// Request timeout for model calls in milliseconds.
    /// Default: 10000
    #[serde(default = "ModelsConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ModelsConfig {
    fn default_timeout_ms() -> u64 {
        10_000
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            pose_url: None,
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

/// Desktop demo launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Interpreter or executable to run.
    /// Default: python3
    #[serde(default = "DemoConfig::default_program")]
    pub program: String,

    /// Script passed as the first argument.
    /// Default: sports_assessment_demo.py
    #[serde(default = "DemoConfig::default_script")]
    pub script: PathBuf,

    /// Working directory for the child. Defaults to the script's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl DemoConfig {
    fn default_program() -> String {
        "python3".to_string()
    }

    fn default_script() -> PathBuf {
        PathBuf::from("sports_assessment_demo.py")
    }

    /// Directory the child process starts in.
    pub fn resolved_working_dir(&self) -> PathBuf {
        if let Some(dir) = &self.working_dir {
            return dir.clone();
        }
        match self.script.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            program: Self::default_program(),
            script: Self::default_script(),
            working_dir: None,
        }
    }
}

/// Placeholder scorecard parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardConfig {
    /// Centre of the generated score.
    /// Default: 85
    #[serde(default = "ScorecardConfig::default_baseline")]
    pub baseline: f64,

    /// Half-width of the integer jitter window `[-jitter, jitter)`.
    /// Default: 10
    #[serde(default = "ScorecardConfig::default_jitter")]
    pub jitter: i64,
}

impl ScorecardConfig {
    fn default_baseline() -> f64 {
        85.0
    }

    fn default_jitter() -> i64 {
        10
    }
}

impl Default for ScorecardConfig {
    fn default() -> Self {
        Self {
            baseline: Self::default_baseline(),
            jitter: Self::default_jitter(),
        }
    }
}

/// Bootstrap configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub demo: DemoConfig,

    #[serde(default)]
    pub scorecard: ScorecardConfig,
}
