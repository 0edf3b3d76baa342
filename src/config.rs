/*!
 * Configuration types for apistore
 */

use apistore_http::HttpConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Top-level configuration, usually loaded from a TOML file
///
/// ```toml
/// [executor]
/// no_content_status = 204
/// accepted_status = { start = 200, end = 300 }
///
/// [http]
/// base_url = "https://pokeapi.co/api/v2/"
/// timeout_secs = 30
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Status policy applied to every completed call
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// HTTP client settings for the default transport
    #[serde(default)]
    pub http: HttpConfig,

    /// Diagnostic logging
    #[serde(default)]
    pub logging: LogConfig,
}

/// How the executor interprets response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Statuses whose payload is considered valid; anything else is a transport failure
    #[serde(default)]
    pub accepted_status: StatusRange,

    /// Status that resolves as `Outcome::NoContent` for response types that accept it
    #[serde(default = "default_no_content_status")]
    pub no_content_status: u16,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            accepted_status: StatusRange::default(),
            no_content_status: default_no_content_status(),
        }
    }
}

/// Half-open range of HTTP status codes, `start..end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRange {
    pub start: u16,
    pub end: u16,
}

impl StatusRange {
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, status: u16) -> bool {
        (self.start..self.end).contains(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl Default for StatusRange {
    fn default() -> Self {
        Self::new(200, 300)
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (overridden by `RUST_LOG` when set)
    #[serde(default)]
    pub level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Emit JSON lines instead of the compact text format
    #[serde(default)]
    pub json: bool,
}

fn default_no_content_status() -> u16 {
    204
}

impl ApiConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ApiConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let range = self.executor.accepted_status;
        if range.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "accepted_status {}..{} is empty",
                range.start, range.end
            )));
        }
        if range.start < 100 || range.end > 600 {
            return Err(ConfigError::Invalid(format!(
                "accepted_status {}..{} must lie within 100..600",
                range.start, range.end
            )));
        }
        if !range.contains(self.executor.no_content_status) {
            return Err(ConfigError::Invalid(format!(
                "no_content_status {} is outside accepted_status {}..{}",
                self.executor.no_content_status, range.start, range.end
            )));
        }
        if self.http.timeout_secs == 0 || self.http.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "HTTP timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.executor.no_content_status, 204);
        assert_eq!(config.executor.accepted_status, StatusRange::new(200, 300));
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_status_range_is_half_open() {
        let range = StatusRange::default();
        assert!(range.contains(200));
        assert!(range.contains(204));
        assert!(range.contains(299));
        assert!(!range.contains(300));
        assert!(!range.contains(199));
        assert!(StatusRange::new(300, 300).is_empty());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ApiConfig::from_toml_str("").unwrap();
        assert_eq!(config, ApiConfig::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            [executor]
            no_content_status = 204
            accepted_status = { start = 200, end = 400 }

            [http]
            base_url = "https://pokeapi.co/api/v2/"
            timeout_secs = 15
            default_headers = { Accept = "application/json" }

            [logging]
            level = "trace"
            json = true
        "#;

        let config = ApiConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.executor.accepted_status.end, 400);
        assert_eq!(config.http.base_url.as_deref(), Some("https://pokeapi.co/api/v2/"));
        assert_eq!(config.http.timeout_secs, 15);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(
            config.http.default_headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(config.logging.level, LogLevel::Trace);
        assert!(config.logging.json);
    }

    #[test]
    fn test_no_content_outside_range_is_rejected() {
        let toml_str = r#"
            [executor]
            no_content_status = 204
            accepted_status = { start = 200, end = 204 }
        "#;

        let result = ApiConfig::from_toml_str(toml_str);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = ApiConfig::from_toml_str("[http]\ntimeout_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_log_level_is_parse_error() {
        let result = ApiConfig::from_toml_str("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let mut config = ApiConfig::default();
        config.http.base_url = Some("http://localhost:8080/".to_string());
        config.logging.level = LogLevel::Debug;

        let file = NamedTempFile::new().unwrap();
        config.save_to_file(file.path()).unwrap();
        let loaded = ApiConfig::from_file(file.path()).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ApiConfig::from_file("/nonexistent/apistore.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
