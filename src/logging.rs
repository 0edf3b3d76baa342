/*!
 * Logging and tracing initialization
 */

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LogConfig;
use crate::error::ConfigError;

pub type BoxedSubscriber = Box<dyn tracing::Subscriber + Send + Sync + 'static>;

/// Build the filter: `RUST_LOG` wins, otherwise `apistore=<level>`
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter, ConfigError> {
    let level = config.level.to_tracing_level();
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(format!(
                "apistore={level},apistore_http={level}",
                level = level
            ))
        })
        .map_err(|e| ConfigError::Logging(format!("Failed to create log filter: {}", e)))
}

/// Initialize structured logging based on configuration
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), ConfigError> {
    build_subscriber(config)?
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))
}

/// Build the subscriber [`init_logging`] installs, without installing it
///
/// Output goes to `config.file` when set, stdout otherwise. `config.json` selects
/// JSON lines over the compact text format for either target.
pub fn build_subscriber(config: &LogConfig) -> Result<BoxedSubscriber, ConfigError> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    let subscriber: BoxedSubscriber = match config.file {
        Some(ref log_path) => {
            let layer = fmt::layer()
                .with_writer(Arc::new(open_log_file(log_path)?))
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_span_events(FmtSpan::CLOSE);
            if config.json {
                Box::new(registry.with(layer.json()))
            } else {
                Box::new(registry.with(layer.compact()))
            }
        }
        None => {
            let layer = fmt::layer().with_target(true);
            if config.json {
                Box::new(registry.with(layer.json()))
            } else {
                Box::new(registry.with(layer.compact()))
            }
        }
    };

    Ok(subscriber)
}

fn open_log_file(log_path: &Path) -> Result<File, ConfigError> {
    File::create(log_path).map_err(|e| {
        ConfigError::Logging(format!(
            "Failed to create log file {}: {}",
            log_path.display(),
            e
        ))
    })
}

/// Route executor events to the test harness output, once per process
#[cfg(test)]
pub fn init_test_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();

    INIT.call_once(|| {
        let config = LogConfig {
            level: crate::config::LogLevel::Debug,
            ..Default::default()
        };
        if let Ok(filter) = env_filter(&config) {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_test_writer().without_time().compact())
                .try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_filter_from_level() {
        let config = LogConfig {
            level: LogLevel::Debug,
            ..Default::default()
        };
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn test_second_init_reports_error() {
        init_test_logging();

        let temp_file = NamedTempFile::new().unwrap();
        let config = LogConfig {
            level: LogLevel::Info,
            file: Some(temp_file.path().to_path_buf()),
            json: false,
        };

        // A subscriber is already installed, so this must fail instead of panicking
        let result = init_logging(&config);
        assert!(matches!(result, Err(ConfigError::Logging(_))));
    }

    fn file_config(path: &Path, json: bool) -> LogConfig {
        LogConfig {
            level: LogLevel::Info,
            file: Some(path.to_path_buf()),
            json,
        }
    }

    #[test]
    fn test_file_output_follows_json_flag() {
        let json_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(&file_config(json_file.path(), true)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "apistore", call_id = 7, "Dispatching request");
        });

        let contents = std::fs::read_to_string(json_file.path()).unwrap();
        let line: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(line["fields"]["message"], "Dispatching request");
        assert_eq!(line["fields"]["call_id"], 7);

        let text_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(&file_config(text_file.path(), false)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "apistore", call_id = 7, "Dispatching request");
        });

        let contents = std::fs::read_to_string(text_file.path()).unwrap();
        assert!(contents.contains("Dispatching request"));
        assert!(contents.contains("call_id=7"));
        assert!(serde_json::from_str::<serde_json::Value>(contents.trim()).is_err());
    }

    #[test]
    fn test_unwritable_log_file_is_rejected() {
        let config = LogConfig {
            file: Some("/nonexistent-dir/apistore.log".into()),
            ..Default::default()
        };
        let result = init_logging(&config);
        assert!(matches!(result, Err(ConfigError::Logging(_))));
    }
}
