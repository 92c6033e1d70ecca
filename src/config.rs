use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api-segmentos.touchone.com.br/api/v1";
pub const DEFAULT_DOMAIN: &str = "app.touchone.com.br";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_INITIAL_LABEL: &str = "Serviços de Beleza";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Debounce interval must be greater than zero")]
    ZeroDebounce,
    #[error("Failed to read env file: {0}")]
    EnvFile(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub domain: String,
    pub debounce_ms: u64,
    pub request_timeout_secs: Option<u64>,
    pub initial_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_secs: None,
            initial_label: DEFAULT_INITIAL_LABEL.to_string(),
        }
    }
}

impl Config {
    /// Load from the process environment after applying a `.env` file, if any.
    /// ENV vars: SEGMENTO_API_URL, SEGMENTO_DOMAIN, SEGMENTO_DEBOUNCE_MS, SEGMENTO_TIMEOUT_SECS
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Values from `path` win over the process environment. The environment is not mutated.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let vars = dotenv::from_path_iter(path.as_ref())
            .map_err(|e| ConfigError::EnvFile(e.to_string()))?
            .collect::<Result<HashMap<String, String>, _>>()
            .map_err(|e| ConfigError::EnvFile(e.to_string()))?;

        Self::from_lookup(|key| vars.get(key).cloned().or_else(|| env::var(key).ok()))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("SEGMENTO_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let domain = lookup("SEGMENTO_DOMAIN")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.domain);
        let debounce_ms = match lookup("SEGMENTO_DEBOUNCE_MS") {
            Some(raw) => parse_number("SEGMENTO_DEBOUNCE_MS", &raw)?,
            None => defaults.debounce_ms,
        };
        let request_timeout_secs = lookup("SEGMENTO_TIMEOUT_SECS")
            .map(|raw| parse_number("SEGMENTO_TIMEOUT_SECS", &raw))
            .transpose()?;

        let cfg = Config {
            base_url: base_url.trim_end_matches('/').to_string(),
            domain,
            debounce_ms,
            request_timeout_secs,
            initial_label: defaults.initial_label,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::InvalidBaseUrl("empty".to_string()));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {}", self.base_url, e)))?;
        if self.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
