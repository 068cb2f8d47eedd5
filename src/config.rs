//! Configuration management for logidoc using the prefer crate.
//!
//! Settings are layered: built-in defaults, then an optional `logidoc`
//! config file discovered by prefer, then environment and CLI overrides
//! applied by the binary.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Backend base URL used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Number of model log entries fetched for the analytics page.
pub const DEFAULT_MODEL_LOG_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Backend API base URL, stored without a trailing slash.
    pub api_base_url: String,
    /// Interface the web server binds to.
    pub host: String,
    /// Port the web server binds to.
    pub port: u16,
    /// Timeout for the backend health probe in seconds.
    pub health_timeout: u64,
    /// Timeout for document extraction in seconds.
    pub extract_timeout: u64,
    /// Timeout for saving a reviewed document in seconds.
    pub save_timeout: u64,
    /// Timeout for every other backend call in seconds.
    pub request_timeout: u64,
    /// Entries fetched for the model log analytics page.
    pub model_log_limit: u32,
    /// Post a model quality record after each successful save.
    pub log_corrections: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8501,
            health_timeout: 5,
            extract_timeout: 90,
            save_timeout: 30,
            request_timeout: 10,
            model_log_limit: DEFAULT_MODEL_LOG_LIMIT,
            log_corrections: true,
        }
    }
}

impl Settings {
    /// Create settings pointing at a specific backend.
    pub fn with_api_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        settings.set_api_base_url(api_base_url)?;
        Ok(settings)
    }

    /// Validate and store a backend base URL.
    pub fn set_api_base_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.api_base_url = normalize_base_url(raw)?;
        Ok(())
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout)
    }

    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.save_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Check that `raw` is an absolute http(s) URL and strip trailing slashes.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API base URL.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Bind address.
    #[serde(default)]
    pub host: Option<String>,
    /// Bind port.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub health_timeout_secs: Option<u64>,
    #[serde(default)]
    pub extract_timeout_secs: Option<u64>,
    #[serde(default)]
    pub save_timeout_secs: Option<u64>,
    /// Timeout for list, detail, delete and model log calls.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub model_log_limit: Option<u32>,
    /// Whether to post a model quality record after saving.
    #[serde(default)]
    pub log_corrections: Option<bool>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers logidoc config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("logidoc").await {
            Ok(pref_config) => Config {
                api_base_url: pref_config.get("api_base_url").ok(),
                host: pref_config.get("host").ok(),
                port: pref_config.get("port").ok(),
                health_timeout_secs: pref_config.get("health_timeout_secs").ok(),
                extract_timeout_secs: pref_config.get("extract_timeout_secs").ok(),
                save_timeout_secs: pref_config.get("save_timeout_secs").ok(),
                request_timeout_secs: pref_config.get("request_timeout_secs").ok(),
                model_log_limit: pref_config.get("model_log_limit").ok(),
                log_corrections: pref_config.get("log_corrections").ok(),
            },
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) -> Result<(), ConfigError> {
        if let Some(ref url) = self.api_base_url {
            settings.set_api_base_url(url)?;
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(secs) = self.health_timeout_secs {
            settings.health_timeout = secs;
        }
        if let Some(secs) = self.extract_timeout_secs {
            settings.extract_timeout = secs;
        }
        if let Some(secs) = self.save_timeout_secs {
            settings.save_timeout = secs;
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout = secs;
        }
        if let Some(limit) = self.model_log_limit {
            settings.model_log_limit = limit;
        }
        if let Some(enabled) = self.log_corrections {
            settings.log_corrections = enabled;
        }
        Ok(())
    }
}

/// Load settings from configuration (async version).
pub async fn load_settings() -> Result<Settings, ConfigError> {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings)?;
    Ok(settings)
}
