//! Configuration loading for trackside.
//!
//! # Configuration Philosophy
//!
//! Configuration is split into two categories:
//!
//! - **Infrastructure** (`InfraConfig`): bind address, telemetry, CORS,
//!   request limits and session expiry. Fixed for the life of the process.
//!
//! - **Bootstrap** (`BootstrapConfig`): collaborator endpoints, the demo
//!   launcher command and scorecard parameters.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/trackside/config.toml` (system)
//! 2. `~/.config/trackside/config.toml` (user)
//! 3. `./trackside.toml` (local override, or the `--config` path)
//! 4. Environment variables (`TRACKSIDE_*`)
//!
//! # Example Config
//!
//! ```toml
//! [bind]
//! host = "0.0.0.0"
//! http_port = 5000
//!
//! [telemetry]
//! otlp_endpoint = "127.0.0.1:4317"
//! log_level = "info"
//!
//! [cors]
//! allowed_origins = ["http://localhost:3000"]
//!
//! [models]
//! pose_url = "http://127.0.0.1:2040"
//!
//! [demo]
//! program = "python3"
//! script = "~/sih/Python-Backend/sports_assessment_demo.py"
//! ```

pub mod bootstrap;
pub mod infra;
pub mod loader;

pub use bootstrap::{BootstrapConfig, DemoConfig, ModelsConfig, ScorecardConfig};
pub use infra::{BindConfig, CorsConfig, InfraConfig, LimitsConfig, SessionsConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),
}

/// Complete trackside configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TrackConfig {
    /// Infrastructure - cannot change at runtime.
    #[serde(flatten)]
    pub infra: InfraConfig,

    /// Bootstrap - collaborators and launch settings.
    #[serde(flatten)]
    pub bootstrap: BootstrapConfig,
}

impl TrackConfig {
    /// Load configuration with `config_path` replacing the local override.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in loader::discover_config_files_with_override(config_path) {
            let table = loader::load_table(&path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path);
        }

        let mut config = loader::from_table(merged, sources.files.last())?;
        loader::apply_env_overrides(&mut config, &mut sources);
        config.validate()?;

        Ok((config, sources))
    }

    /// Reject values the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.infra.cors.allowed_origins.is_empty() {
            return Err(ConfigError::Invalid(
                "cors.allowed_origins must list at least one origin".to_string(),
            ));
        }
        if self.infra.sessions.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sessions.cleanup_interval_secs must be positive".to_string(),
            ));
        }
        if self.bootstrap.scorecard.jitter < 0 {
            return Err(ConfigError::Invalid(
                "scorecard.jitter must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let body =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(format!("# trackside configuration\n\n{}", body))
    }
}
