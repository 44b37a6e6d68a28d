//! Panel configuration
//!
//! Loaded from the environment (a `.env` file is honoured via dotenvy):
//! - `DOCSPOT_BACKEND_URL`: REST backend base URL
//! - `DOCSPOT_ASSET_UPLOAD_URL` / `DOCSPOT_UPLOAD_PRESET`: image host used before doctor creation
//! - `DOCSPOT_STATE_DIR`: sled directory holding the session tokens
//! - `DOCSPOT_REQUEST_TIMEOUT_SECS` / `DOCSPOT_UPLOAD_TIMEOUT_SECS`
//! - `DOCSPOT_CURRENCY`, `DOCSPOT_LOG_JSON`, `DOCSPOT_LOG_DIR`

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:4000";
pub const DEFAULT_ASSET_UPLOAD_URL: &str = "https://api.cloudinary.com/v1_1/dlgq89kur/image/upload";
pub const DEFAULT_UPLOAD_PRESET: &str = "prescripto_unsigned";
pub const DEFAULT_STATE_DIR: &str = "docspot_state";
pub const DEFAULT_CURRENCY: &str = "₹";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be an http(s) URL, got '{value}'")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{name} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { name: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub backend_url: String,
    pub asset_upload_url: String,
    pub upload_preset: String,
    pub state_dir: PathBuf,
    /// Fixed timeout applied to every backend request.
    pub request_timeout: Duration,
    /// Longer timeout for the doctor creation request.
    pub upload_timeout: Duration,
    pub currency: String,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            asset_upload_url: DEFAULT_ASSET_UPLOAD_URL.to_string(),
            upload_preset: DEFAULT_UPLOAD_PRESET.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            request_timeout: Duration::from_secs(10),
            upload_timeout: Duration::from_secs(60),
            currency: DEFAULT_CURRENCY.to_string(),
            log_json: false,
            log_dir: None,
        }
    }
}

impl PanelConfig {
    /// Load `.env` if present, then read `DOCSPOT_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DOCSPOT_BACKEND_URL") {
            config.backend_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = lookup("DOCSPOT_ASSET_UPLOAD_URL") {
            config.asset_upload_url = url;
        }
        if let Some(preset) = lookup("DOCSPOT_UPLOAD_PRESET") {
            config.upload_preset = preset;
        }
        if let Some(dir) = lookup("DOCSPOT_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("DOCSPOT_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = parse_timeout("DOCSPOT_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("DOCSPOT_UPLOAD_TIMEOUT_SECS") {
            config.upload_timeout = parse_timeout("DOCSPOT_UPLOAD_TIMEOUT_SECS", &secs)?;
        }
        if let Some(currency) = lookup("DOCSPOT_CURRENCY") {
            config.currency = currency;
        }
        if let Some(flag) = lookup("DOCSPOT_LOG_JSON") {
            config.log_json = matches!(flag.trim(), "1" | "true" | "yes");
        }
        config.log_dir = lookup("DOCSPOT_LOG_DIR").map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("DOCSPOT_BACKEND_URL", &self.backend_url)?;
        check_url("DOCSPOT_ASSET_UPLOAD_URL", &self.asset_upload_url)?;
        if self.upload_preset.trim().is_empty() {
            return Err(ConfigError::Empty("DOCSPOT_UPLOAD_PRESET"));
        }
        if self.state_dir.as_os_str().is_empty() {
            return Err(ConfigError::Empty("DOCSPOT_STATE_DIR"));
        }
        Ok(())
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl { name, value: value.to_string() })
    }
}

fn parse_timeout(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout { name, value: value.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = PanelConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.upload_timeout, Duration::from_secs(60));
        assert_eq!(config.currency, "₹");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = PanelConfig::from_lookup(lookup_from(&[
            ("DOCSPOT_BACKEND_URL", "https://api.docspot.test/"),
            ("DOCSPOT_REQUEST_TIMEOUT_SECS", "25"),
            ("DOCSPOT_CURRENCY", "$"),
            ("DOCSPOT_LOG_JSON", "true"),
        ]))
        .unwrap();
        assert_eq!(config.backend_url, "https://api.docspot.test");
        assert_eq!(config.request_timeout, Duration::from_secs(25));
        assert_eq!(config.currency, "$");
        assert!(config.log_json);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = PanelConfig::from_lookup(lookup_from(&[("DOCSPOT_BACKEND_URL", "localhost:4000")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));

        let err = PanelConfig::from_lookup(lookup_from(&[("DOCSPOT_UPLOAD_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
    }
}
