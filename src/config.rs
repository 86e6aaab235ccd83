use crate::common::constants::{
    DEFAULT_ACCEPT_LANGUAGE, DEFAULT_REFERER, DEFAULT_USER_AGENT, EDREAMS_BASE_URL,
    RYANAIR_BASE_URL, RYANAIR_DEFAULT_DELAY_MS, RYANAIR_DEFAULT_MARKET,
};
use crate::common::error::{Result, ScanError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "flyscanner.toml";
const CONFIG_PATH_ENV: &str = "FLYSCANNER_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub edreams: EDreamsConfig,
    #[serde(default)]
    pub ryanair: RyanairConfig,
    /// Directory for JSON log files; console-only logging when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EDreamsConfig {
    #[serde(default = "default_edreams_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RyanairConfig {
    #[serde(default = "default_ryanair_base_url")]
    pub base_url: String,
    #[serde(default = "default_ryanair_market")]
    pub market: String,
    /// Pause before every availability request
    #[serde(default = "default_ryanair_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            referer: default_referer(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for EDreamsConfig {
    fn default() -> Self {
        Self {
            base_url: default_edreams_base_url(),
        }
    }
}

impl Default for RyanairConfig {
    fn default() -> Self {
        Self {
            base_url: default_ryanair_base_url(),
            market: default_ryanair_market(),
            request_delay_ms: default_ryanair_delay_ms(),
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept_language() -> String {
    DEFAULT_ACCEPT_LANGUAGE.to_string()
}

fn default_referer() -> String {
    DEFAULT_REFERER.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_edreams_base_url() -> String {
    EDREAMS_BASE_URL.to_string()
}

fn default_ryanair_base_url() -> String {
    RYANAIR_BASE_URL.to_string()
}

fn default_ryanair_market() -> String {
    RYANAIR_DEFAULT_MARKET.to_string()
}

fn default_ryanair_delay_ms() -> u64 {
    RYANAIR_DEFAULT_DELAY_MS
}

impl Config {
    /// Load `flyscanner.toml` (or the file named by `FLYSCANNER_CONFIG`).
    /// A missing file yields the built-in defaults.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let config_path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        if !config_path.exists() {
            debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::from_path(&config_path)
    }

    pub fn from_path(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScanError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.edreams.base_url, EDREAMS_BASE_URL);
        assert_eq!(config.ryanair.market, "it-it");
        assert_eq!(config.ryanair.request_delay_ms, 1000);
        assert_eq!(config.http.timeout_seconds, 30);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_partial_sections_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            log_dir = "logs"

            [ryanair]
            market = "en-gb"
            request_delay_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.ryanair.market, "en-gb");
        assert_eq!(config.ryanair.request_delay_ms, 0);
        assert_eq!(config.ryanair.base_url, RYANAIR_BASE_URL);
        assert_eq!(config.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let result = Config::from_path(Path::new("/nonexistent/flyscanner.toml"));
        assert!(matches!(result, Err(ScanError::Config(_))));
    }
}
