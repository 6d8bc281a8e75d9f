//! Configuration file handling for the order wizard.
//!
//! A single JSON file; every field has a default, so a partial file (or no
//! file at all) is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::pricing::{DEFAULT_CURRENCY, PriceTable};
use crate::selection::DEFAULT_UNDO_WINDOW;
use crate::service::AddOnPricingPolicy;

/// Upper bound for the request timeout and the undo window, in seconds.
const MAX_SECS: u64 = 300;

/// Application configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Order API root, e.g. `http://localhost:3000/api`
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Lifetime of the undo offered after an installation type switch
    pub undo_window_secs: u64,
    /// Currency label used when formatting prices
    pub currency: String,
    pub pricing: PriceTable,
    /// Add-on price handling in the in-memory backend
    pub addon_pricing: AddOnPricingPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            request_timeout_secs: 30,
            undo_window_secs: DEFAULT_UNDO_WINDOW.as_secs(),
            currency: DEFAULT_CURRENCY.to_string(),
            pricing: PriceTable::default(),
            addon_pricing: AddOnPricingPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Load and validate `path`, or fall back to defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                debug!("Loading configuration from {:?}", path);
                Self::load_from_file(path)?
            }
            None => {
                debug!("No configuration file given, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            anyhow::bail!("api_base_url must be specified");
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("api_base_url must start with http:// or https://");
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_SECS {
            anyhow::bail!("request_timeout_secs must be between 1 and {}", MAX_SECS);
        }
        if self.undo_window_secs == 0 || self.undo_window_secs > MAX_SECS {
            anyhow::bail!("undo_window_secs must be between 1 and {}", MAX_SECS);
        }

        if self.currency.trim().is_empty() {
            anyhow::bail!("currency must be specified");
        }

        if self.pricing.full_installation == 0 || self.pricing.dual_boot_installation == 0 {
            anyhow::bail!("Installation prices must be greater than zero");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.undo_window(), Duration::from_secs(10));
        assert_eq!(config.currency, "KSh");
        assert_eq!(config.addon_pricing, AddOnPricingPolicy::ClientSnapshot);
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let mut config = AppConfig::default();
        config.api_base_url = "https://orders.example.com/api".to_string();
        config.pricing.office_suite = 75;
        config.addon_pricing = AddOnPricingPolicy::Authoritative;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        config.save_to_file(temp_file.path()).expect("Failed to save config");

        let loaded = AppConfig::load_from_file(temp_file.path()).expect("Failed to load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"currency": "USD", "pricing": {"office_suite": 60}}"#)
            .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.pricing.office_suite, 60);
        assert_eq!(config.pricing.full_installation, 100);
        assert_eq!(config.undo_window_secs, 10);
    }

    #[test]
    fn test_policy_wire_value() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"addon_pricing": "authoritative"}"#).unwrap();
        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.addon_pricing, AddOnPricingPolicy::Authoritative);
    }

    #[test]
    fn test_load_missing_file() {
        let result = AppConfig::load_from_file("/nonexistent/techserve.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ invalid json }").unwrap();
        assert!(AppConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = AppConfig::load_or_default(None).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = AppConfig::default();
        config.api_base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.api_base_url = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_windows_rejected() {
        let mut config = AppConfig::default();
        config.undo_window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.request_timeout_secs = MAX_SECS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_base_price_rejected() {
        let mut config = AppConfig::default();
        config.pricing.dual_boot_installation = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_validates() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"currency": ""}"#).unwrap();
        assert!(AppConfig::load_or_default(Some(file.path())).is_err());
    }
}
