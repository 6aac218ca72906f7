//! Infrastructure configuration - things that cannot change at runtime.

use serde::{Deserialize, Serialize};

/// Network bind address for the HTTP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindConfig {
    /// Interface to listen on.
    /// Default: 0.0.0.0
    #[serde(default = "BindConfig::default_host")]
    pub host: String,

    /// HTTP port for every endpoint.
    /// Default: 5000
    #[serde(default = "BindConfig::default_http_port")]
    pub http_port: u16,
}

impl BindConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_http_port() -> u16 {
        5000
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            http_port: Self::default_http_port(),
        }
    }
}

/// Telemetry and observability configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// OTLP gRPC endpoint for OpenTelemetry. Unset means console logging only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otlp_endpoint: Option<String>,

    /// Log filter directive (trace, debug, info, warn, error, or a full EnvFilter).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            log_level: Self::default_log_level(),
        }
    }
}

/// Cross-origin policy for the browser frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API.
    /// Default: the two local frontend dev servers
    #[serde(default = "CorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    fn default_allowed_origins() -> Vec<String> {
        vec![
            "http://localhost:3004".to_string(),
            "http://localhost:3000".to_string(),
        ]
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Self::default_allowed_origins(),
        }
    }
}

/// Request and image decoding limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum request body size.
    /// Default: 16 MiB
    #[serde(default = "LimitsConfig::default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Maximum decoded image width in pixels.
    /// Default: 4096
    #[serde(default = "LimitsConfig::default_max_image_dimension")]
    pub max_image_width: u32,

    /// Maximum decoded image height in pixels.
    /// Default: 4096
    #[serde(default = "LimitsConfig::default_max_image_dimension")]
    pub max_image_height: u32,

    /// Maximum bytes the image decoder may allocate.
    /// Default: 256 MiB
    #[serde(default = "LimitsConfig::default_max_image_alloc_bytes")]
    pub max_image_alloc_bytes: u64,
}

impl LimitsConfig {
    fn default_max_body_bytes() -> usize {
        16 * 1024 * 1024
    }

    fn default_max_image_dimension() -> u32 {
        4096
    }

    fn default_max_image_alloc_bytes() -> u64 {
        256 * 1024 * 1024
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: Self::default_max_body_bytes(),
            max_image_width: Self::default_max_image_dimension(),
            max_image_height: Self::default_max_image_dimension(),
            max_image_alloc_bytes: Self::default_max_image_alloc_bytes(),
        }
    }
}

/// Exercise session expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Sessions idle longer than this are dropped.
    /// Default: 1800 (30 min)
    #[serde(default = "SessionsConfig::default_max_idle_secs")]
    pub max_idle_secs: u64,

    /// How often the cleanup task runs.
    /// Default: 60
    #[serde(default = "SessionsConfig::default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl SessionsConfig {
    fn default_max_idle_secs() -> u64 {
        1800
    }

    fn default_cleanup_interval_secs() -> u64 {
        60
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_idle_secs: Self::default_max_idle_secs(),
            cleanup_interval_secs: Self::default_cleanup_interval_secs(),
        }
    }
}

/// Infrastructure configuration - cannot change at runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfraConfig {
    /// Network bind address.
    #[serde(default)]
    pub bind: BindConfig,

    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Body and image limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Session expiry.
    #[serde(default)]
    pub sessions: SessionsConfig,
}
