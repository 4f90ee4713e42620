//! Configuration loading
//!
//! Non-secret settings live in a TOML file in the platform config dir
//! (`~/.config/roaster-cli/config.toml` on Linux); API tokens come from the
//! environment, with `.env` loaded at startup. A missing config file means
//! defaults, so the tool works against a standard CMS setup with only the
//! space id and tokens supplied.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::RetryConfig;

/// Environment variable holding the CMS management token.
pub const CMS_TOKEN_VAR: &str = "ROASTER_CMS_TOKEN";

/// Environment variable holding the geocoding token. Optional: without it,
/// rows without direct coordinates import with no location.
pub const GEOCODE_TOKEN_VAR: &str = "ROASTER_GEOCODE_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cms: CmsConfig,
    pub geocode: GeocodeConfig,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub base_url: String,
    /// Space id of the site content. Required for `import run`.
    pub space: String,
    pub environment: String,
    /// Content type of directory entries.
    pub collection: String,
    pub locale: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.contentful.com".to_string(),
            space: String::new(),
            environment: "master".to_string(),
            collection: "shop".to_string(),
            locale: "en-US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    pub base_url: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mapbox.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            ..RetryConfig::default()
        }
    }
}

/// Path of the config file, if a platform config dir exists.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("roaster-cli").join("config.toml"))
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load() -> Result<Config> {
    let Some(path) = config_path() else {
        debug!("no platform config dir, using default configuration");
        return Ok(Config::default());
    };
    if !path.exists() {
        debug!("{} not found, using default configuration", path.display());
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// CMS management token from the environment. Required for `import run`.
pub fn cms_token() -> Result<String> {
    env::var(CMS_TOKEN_VAR)
        .with_context(|| format!("{} is not set; export it or add it to .env", CMS_TOKEN_VAR))
}

/// Geocoding token from the environment, if configured.
pub fn geocode_token() -> Option<String> {
    env::var(GEOCODE_TOKEN_VAR).ok().filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cms.base_url, "https://api.contentful.com");
        assert_eq!(config.cms.environment, "master");
        assert_eq!(config.cms.collection, "shop");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cms]
            space = "abc123"
            collection = "roaster"
            "#,
        )
        .unwrap();
        assert_eq!(config.cms.space, "abc123");
        assert_eq!(config.cms.collection, "roaster");
        assert_eq!(config.cms.locale, "en-US");
        assert_eq!(config.geocode.base_url, "https://api.mapbox.com");
    }

    #[test]
    fn retry_settings_convert_to_retry_config() {
        let settings = RetrySettings { max_attempts: 5, base_delay_ms: 100, max_delay_ms: 1_000 };
        let retry = settings.to_retry_config();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.base_delay, Duration::from_millis(100));
        assert_eq!(retry.max_delay, Duration::from_millis(1_000));
    }
}
