use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the DPDP Shield backend (without the /api prefix)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Directory for the session file and dashboard log
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Polling cadences in seconds. The breach poller switches between the
/// active and idle intervals depending on whether a breach is in progress.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_active")]
    pub active_secs: u64,
    #[serde(default = "default_poll_idle")]
    pub idle_secs: u64,
    #[serde(default = "default_poll_mailbox")]
    pub mailbox_secs: u64,
    #[serde(default = "default_poll_reports")]
    pub reports_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            active_secs: default_poll_active(),
            idle_secs: default_poll_idle(),
            mailbox_secs: default_poll_mailbox(),
            reports_secs: default_poll_reports(),
        }
    }
}

fn default_poll_active() -> u64 {
    2
}

fn default_poll_idle() -> u64 {
    10
}

fn default_poll_mailbox() -> u64 {
    15
}

fn default_poll_reports() -> u64 {
    10
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = Config::load(Path::new("/nonexistent/dpdp-shield.toml")).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8000");
        assert_eq!(config.poll.active_secs, 2);
        assert_eq!(config.poll.idle_secs, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            base_url = "https://shield.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.base_url, "https://shield.example.com");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.poll.mailbox_secs, 15);
    }
}
