//! File logging for the headless controller
//!
//! stdout carries the NDJSON stream, so every log line goes to a daily
//! rolling file. The directory and the default filter come from
//! [`LogOptions`]; `SHOVEL_LOG` still wins over the configured filter.
//!
//! ```bash
//! SHOVEL_LOG=debug shovel --server http://localhost:8000/
//! SHOVEL_LOG=shovel_app=trace shovel --log-dir /tmp/shovel-logs
//! ```

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "SHOVEL_LOG";

/// Filter used when neither `SHOVEL_LOG` nor the settings provide one.
pub const DEFAULT_FILTER: &str = "shovel=info,warn";

/// File name prefix; the appender adds the date.
const LOG_FILE_PREFIX: &str = "shovel.log";

/// Where and how much to log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Log directory, `<data dir>/shovel/logs` when unset
    pub directory: Option<PathBuf>,

    /// Filter directive used when `SHOVEL_LOG` is unset
    pub filter: Option<String>,
}

impl LogOptions {
    pub fn log_directory(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("shovel")
                .join("logs"),
        }
    }

    /// Pick the filter directive: `env`, then the configured one, then
    /// [`DEFAULT_FILTER`]. Blank values are skipped.
    fn directive(&self, env: Option<String>) -> String {
        env.into_iter()
            .chain(self.filter.clone())
            .find(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }
}

/// Parse `directive`, falling back to [`DEFAULT_FILTER`].
///
/// The rejected directive is returned so it can be logged once the
/// subscriber is up.
fn build_filter(directive: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(directive) {
        Ok(filter) => (filter, None),
        Err(_) => (EnvFilter::new(DEFAULT_FILTER), Some(directive.to_string())),
    }
}

/// Install the file subscriber. Returns the log directory.
pub fn init(options: &LogOptions) -> Result<PathBuf> {
    let log_dir = options.log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let (env_filter, rejected) = build_filter(&options.directive(std::env::var(LOG_ENV).ok()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| Error::config(format!("Logging already initialized: {e}")))?;

    if let Some(directive) = rejected {
        tracing::warn!("Ignoring invalid log filter '{}'", directive);
    }
    tracing::info!("Shovel logging to {}", log_dir.display());

    Ok(log_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_precedence() {
        let options = LogOptions {
            filter: Some("shovel_app=debug".to_string()),
            ..Default::default()
        };
        assert_eq!(options.directive(Some("trace".into())), "trace");
        assert_eq!(options.directive(None), "shovel_app=debug");
        assert_eq!(options.directive(Some("  ".into())), "shovel_app=debug");
        assert_eq!(LogOptions::default().directive(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_configured_directory() {
        let options = LogOptions {
            directory: Some(PathBuf::from("/var/log/shovel")),
            ..Default::default()
        };
        assert_eq!(options.log_directory(), PathBuf::from("/var/log/shovel"));
        assert!(LogOptions::default()
            .log_directory()
            .ends_with(PathBuf::from("shovel").join("logs")));
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let (_, rejected) = build_filter("shovel=loud");
        assert_eq!(rejected.as_deref(), Some("shovel=loud"));

        let (_, rejected) = build_filter(DEFAULT_FILTER);
        assert!(rejected.is_none());
    }
}
