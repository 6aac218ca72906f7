//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, TrackConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/trackside/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("trackside/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("trackside.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a config file as a raw TOML table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    contents
        .parse()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Load a single config file on top of compiled defaults.
pub fn load_from_file(path: &Path) -> Result<TrackConfig, ConfigError> {
    let table = load_table(path)?;
    from_table(table, Some(&path.to_path_buf()))
}

/// Deep-merge `overlay` into `base`. Nested tables merge key by key; any
/// other value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Build a config from a merged table. Missing keys take compiled defaults.
pub fn from_table(
    table: toml::Table,
    origin: Option<&PathBuf>,
) -> Result<TrackConfig, ConfigError> {
    let mut config: TrackConfig =
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse {
                path: origin.cloned().unwrap_or_default(),
                message: e.to_string(),
            })?;

    let demo = &mut config.bootstrap.demo;
    demo.script = expand_path(&demo.script.to_string_lossy());
    if let Some(dir) = demo.working_dir.take() {
        demo.working_dir = Some(expand_path(&dir.to_string_lossy()));
    }

    Ok(config)
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut TrackConfig, sources: &mut ConfigSources) {
    apply_overrides_with(config, sources, |key| env::var(key).ok());
}

/// Apply overrides using `lookup` in place of the process environment.
pub fn apply_overrides_with<F>(config: &mut TrackConfig, sources: &mut ConfigSources, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let mut record = |key: &str| sources.env_overrides.push(key.to_string());

    // Bind address
    if let Some(v) = lookup("TRACKSIDE_HOST") {
        config.infra.bind.host = v;
        record("TRACKSIDE_HOST");
    }
    if let Some(v) = lookup("TRACKSIDE_HTTP_PORT") {
        if let Ok(port) = v.parse() {
            config.infra.bind.http_port = port;
            record("TRACKSIDE_HTTP_PORT");
        }
    }

    // Telemetry
    if let Some(v) = lookup("TRACKSIDE_OTLP_ENDPOINT") {
        config.infra.telemetry.otlp_endpoint = Some(v);
        record("TRACKSIDE_OTLP_ENDPOINT");
    }
    // Also support standard OTEL env var
    if let Some(v) = lookup("OTEL_EXPORTER_OTLP_ENDPOINT") {
        config.infra.telemetry.otlp_endpoint = Some(v);
        record("OTEL_EXPORTER_OTLP_ENDPOINT");
    }
    if let Some(v) = lookup("TRACKSIDE_LOG_LEVEL") {
        config.infra.telemetry.log_level = v;
        record("TRACKSIDE_LOG_LEVEL");
    }
    // Also support RUST_LOG
    if let Some(v) = lookup("RUST_LOG") {
        config.infra.telemetry.log_level = v;
        record("RUST_LOG");
    }

    if let Some(v) = lookup("TRACKSIDE_CORS_ORIGINS") {
        let origins: Vec<String> = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !origins.is_empty() {
            config.infra.cors.allowed_origins = origins;
            record("TRACKSIDE_CORS_ORIGINS");
        }
    }

    // Collaborators
    if let Some(v) = lookup("TRACKSIDE_POSE_URL") {
        config.bootstrap.models.pose_url = if v.is_empty() { None } else { Some(v) };
        record("TRACKSIDE_POSE_URL");
    }
    if let Some(v) = lookup("TRACKSIDE_DEMO_PROGRAM") {
        config.bootstrap.demo.program = v;
        record("TRACKSIDE_DEMO_PROGRAM");
    }
    if let Some(v) = lookup("TRACKSIDE_DEMO_SCRIPT") {
        config.bootstrap.demo.script = expand_path(&v);
        record("TRACKSIDE_DEMO_SCRIPT");
    }
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn parse(text: &str) -> TrackConfig {
        let table: toml::Table = text.parse().unwrap();
        from_table(table, None).unwrap()
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/test/path");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_absolute() {
        let expanded = expand_path("/absolute/path");
        assert_eq!(expanded, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = parse(
            r#"
[bind]
http_port = 9000
"#,
        );
        assert_eq!(config.infra.bind.http_port, 9000);
        // Other values should be defaults
        assert_eq!(config.infra.bind.host, "0.0.0.0");
        assert_eq!(config.bootstrap.scorecard.baseline, 85.0);
    }

    #[test]
    fn test_parse_full_toml() {
        let config = parse(
            r#"
[bind]
host = "127.0.0.1"
http_port = 5050

[telemetry]
otlp_endpoint = "127.0.0.1:4317"
log_level = "debug"

[cors]
allowed_origins = ["https://coach.example.org"]

[limits]
max_image_width = 1920
max_image_height = 1080

[sessions]
max_idle_secs = 600

[models]
pose_url = "http://gpu:2040"
timeout_ms = 2500

[demo]
program = "/usr/bin/python3.11"
script = "/opt/sih/demo.py"

[scorecard]
baseline = 70
jitter = 5
"#,
        );

        assert_eq!(config.infra.bind.addr(), "127.0.0.1:5050");
        assert_eq!(
            config.infra.telemetry.otlp_endpoint.as_deref(),
            Some("127.0.0.1:4317")
        );
        assert_eq!(config.infra.telemetry.log_level, "debug");
        assert_eq!(
            config.infra.cors.allowed_origins,
            vec!["https://coach.example.org".to_string()]
        );
        assert_eq!(config.infra.limits.max_image_width, 1920);
        assert_eq!(config.infra.limits.max_image_height, 1080);
        assert_eq!(config.infra.sessions.max_idle_secs, 600);
        assert_eq!(config.bootstrap.models.pose_url.as_deref(), Some("http://gpu:2040"));
        assert_eq!(config.bootstrap.models.timeout_ms, 2500);
        assert_eq!(config.bootstrap.demo.program, "/usr/bin/python3.11");
        assert_eq!(config.bootstrap.demo.script, PathBuf::from("/opt/sih/demo.py"));
        assert_eq!(config.bootstrap.scorecard.baseline, 70.0);
        assert_eq!(config.bootstrap.scorecard.jitter, 5);
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let table: toml::Table = "[bind]\nhttp_port = \"five thousand\"\n".parse().unwrap();
        assert!(matches!(
            from_table(table, None),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_merge_tables_is_deep() {
        let mut base: toml::Table = r#"
[bind]
host = "127.0.0.1"
http_port = 5000
"#
        .parse()
        .unwrap();
        let overlay: toml::Table = "[bind]\nhttp_port = 6000\n".parse().unwrap();

        merge_tables(&mut base, overlay);
        let config = from_table(base, None).unwrap();

        assert_eq!(config.infra.bind.host, "127.0.0.1");
        assert_eq!(config.infra.bind.http_port, 6000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[models]\npose_url = \"http://localhost:2040\"").unwrap();

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(
            config.bootstrap.models.pose_url.as_deref(),
            Some("http://localhost:2040")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_from_file(Path::new("/nonexistent/trackside.toml"));
        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TRACKSIDE_HTTP_PORT", "7000"),
            ("TRACKSIDE_CORS_ORIGINS", "http://a.test, http://b.test"),
            ("TRACKSIDE_POSE_URL", "http://pose:2040"),
            ("RUST_LOG", "trackside=trace"),
        ]
        .into_iter()
        .collect();

        let mut config = TrackConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_with(&mut config, &mut sources, |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.infra.bind.http_port, 7000);
        assert_eq!(
            config.infra.cors.allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(config.bootstrap.models.pose_url.as_deref(), Some("http://pose:2040"));
        assert_eq!(config.infra.telemetry.log_level, "trackside=trace");
        assert_eq!(sources.env_overrides.len(), 4);
    }

    #[test]
    fn test_env_override_bad_port_ignored() {
        let mut config = TrackConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_with(&mut config, &mut sources, |key| {
            (key == "TRACKSIDE_HTTP_PORT").then(|| "not-a-port".to_string())
        });

        assert_eq!(config.infra.bind.http_port, 5000);
        assert!(sources.env_overrides.is_empty());
    }
}
