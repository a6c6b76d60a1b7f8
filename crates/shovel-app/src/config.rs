//! Viewer settings (`shovel.toml`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shovel_client::ReconnectPolicy;
use shovel_core::logging::LogOptions;
use shovel_core::prelude::*;
use url::Url;

/// Default settings file name, looked up in the working directory.
pub const CONFIG_FILENAME: &str = "shovel.toml";

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub events: EventSettings,

    #[serde(default)]
    pub detail: DetailSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Flow API location
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Base URL the API paths (`api/flow`, `api/events`) are resolved against
    #[serde(default = "default_server_url")]
    pub url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

/// Push subscription settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventSettings {
    /// Subscribe to `api/events` at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Flow detail settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DetailSettings {
    /// Fetch the full flow record whenever the selection changes
    #[serde(default = "default_true")]
    pub fetch_on_select: bool,
}

impl Default for DetailSettings {
    fn default() -> Self {
        Self {
            fetch_on_select: true,
        }
    }
}

/// Log file settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log directory (platform data directory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Filter directive, e.g. `shovel_app=debug`; `SHOVEL_LOG` overrides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_server_url() -> String {
    "http://localhost:8000/".to_string()
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Settings {
    /// Parsed server URL.
    pub fn server_url(&self) -> Result<Url> {
        Url::parse(&self.server.url)
            .map_err(|e| Error::config(format!("Invalid server URL '{}': {}", self.server.url, e)))
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            directory: self.logging.directory.clone(),
            filter: self.logging.filter.clone(),
        }
    }

    /// Reconnection timing of the push subscription.
    ///
    /// A cap below the initial backoff is raised to it.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let initial = Duration::from_millis(self.events.initial_backoff_ms.max(1));
        let max = Duration::from_millis(self.events.max_backoff_ms).max(initial);
        ReconnectPolicy {
            initial_backoff: initial,
            max_backoff: max,
        }
    }
}

/// Load settings from `path`.
///
/// A missing file yields the defaults. Unreadable or malformed files are a
/// config error; the caller decides whether to fall back.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;
    let settings = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))?;
    debug!("Loaded settings from {:?}", path);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.url, "http://localhost:8000/");
        assert!(settings.events.enabled);
        assert!(settings.detail.fetch_on_select);
        assert_eq!(
            settings.reconnect_policy(),
            ReconnectPolicy {
                initial_backoff: Duration::from_secs(1),
                max_backoff: Duration::from_secs(30),
            }
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[server]
url = "http://10.13.37.1:8000/shovel/"

[events]
max_backoff_ms = 5000

[logging]
filter = "shovel_app=debug"
"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.server.url, "http://10.13.37.1:8000/shovel/");
        assert!(settings.events.enabled);
        assert_eq!(settings.events.initial_backoff_ms, 1_000);
        assert_eq!(settings.events.max_backoff_ms, 5_000);
        assert!(settings.detail.fetch_on_select);

        let log = settings.log_options();
        assert_eq!(log.filter.as_deref(), Some("shovel_app=debug"));
        assert_eq!(log.directory, None);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[server\nurl = ").unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains(CONFIG_FILENAME));
    }

    #[test]
    fn test_invalid_server_url_is_config_error() {
        let mut settings = Settings::default();
        settings.server.url = "not a url".to_string();
        let err = settings.server_url().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_backoff_cap_not_below_initial() {
        let mut settings = Settings::default();
        settings.events.initial_backoff_ms = 2_000;
        settings.events.max_backoff_ms = 500;
        let policy = settings.reconnect_policy();
        assert_eq!(policy.max_backoff, Duration::from_secs(2));
    }
}
