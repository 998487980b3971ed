//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SQUIRREL_*)
//! 2. TOML config file (if SQUIRREL_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SQUIRREL_*)
/// 2. TOML config file (if SQUIRREL_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite archive database.
    ///
    /// Set via SQUIRREL_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Number of prepared statements kept in the per-connection cache.
    #[serde(default = "default_statement_cache_capacity")]
    pub statement_cache_capacity: usize,

    /// Maximum number of favicon lookups in flight during one enrichment.
    ///
    /// Set via SQUIRREL_FAVICON_CONCURRENCY environment variable.
    #[serde(default = "default_favicon_concurrency")]
    pub favicon_concurrency: usize,

    /// Per-lookup favicon timeout in milliseconds.
    ///
    /// Set via SQUIRREL_FAVICON_TIMEOUT_MS environment variable.
    #[serde(default = "default_favicon_timeout_ms")]
    pub favicon_timeout_ms: u64,

    /// Icon-by-domain service prefix used when a lookup fails.
    ///
    /// The tab's host is appended verbatim.
    #[serde(default = "default_favicon_fallback_service")]
    pub favicon_fallback_service: String,

    /// Maximum favicon payload size in bytes.
    #[serde(default = "default_favicon_max_bytes")]
    pub favicon_max_bytes: usize,

    /// User-Agent string for favicon requests.
    ///
    /// Set via SQUIRREL_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whether a saved tab list may contain the same URL more than once.
    ///
    /// Set via SQUIRREL_ALLOW_DUPLICATE_URLS environment variable.
    #[serde(default)]
    pub allow_duplicate_urls: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./squirrel-archive.sqlite")
}

fn default_statement_cache_capacity() -> usize {
    64
}

fn default_favicon_concurrency() -> usize {
    8
}

fn default_favicon_timeout_ms() -> u64 {
    3_000
}

fn default_favicon_fallback_service() -> String {
    "https://www.google.com/s2/favicons?domain=".into()
}

fn default_favicon_max_bytes() -> usize {
    262_144 // 256KB
}

fn default_user_agent() -> String {
    "squirrel/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            statement_cache_capacity: default_statement_cache_capacity(),
            favicon_concurrency: default_favicon_concurrency(),
            favicon_timeout_ms: default_favicon_timeout_ms(),
            favicon_fallback_service: default_favicon_fallback_service(),
            favicon_max_bytes: default_favicon_max_bytes(),
            user_agent: default_user_agent(),
            allow_duplicate_urls: false,
        }
    }
}

impl AppConfig {
    /// Favicon timeout as Duration for use with tokio/reqwest.
    pub fn favicon_timeout(&self) -> Duration {
        Duration::from_millis(self.favicon_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SQUIRREL_`
    /// 2. TOML file from `SQUIRREL_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SQUIRREL_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SQUIRREL_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./squirrel-archive.sqlite"));
        assert_eq!(config.statement_cache_capacity, 64);
        assert_eq!(config.favicon_concurrency, 8);
        assert_eq!(config.favicon_timeout_ms, 3_000);
        assert_eq!(config.favicon_max_bytes, 262_144);
        assert_eq!(config.user_agent, "squirrel/0.1");
        assert!(!config.allow_duplicate_urls);
        assert!(config.favicon_fallback_service.starts_with("https://"));
    }

    #[test]
    fn test_favicon_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.favicon_timeout(), Duration::from_millis(3_000));
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "squirrel.toml",
                r#"
                favicon_concurrency = 2
                allow_duplicate_urls = true
                "#,
            )?;
            jail.set_env("SQUIRREL_CONFIG_FILE", "squirrel.toml");
            jail.set_env("SQUIRREL_FAVICON_TIMEOUT_MS", "750");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.favicon_concurrency, 2);
            assert!(config.allow_duplicate_urls);
            assert_eq!(config.favicon_timeout_ms, 750);
            assert_eq!(config.user_agent, "squirrel/0.1");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SQUIRREL_FAVICON_CONCURRENCY", "0");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "favicon_concurrency"));
            Ok(())
        });
    }
}
