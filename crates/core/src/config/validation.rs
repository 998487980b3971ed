//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound for every concurrency knob.
const MAX_CONCURRENCY: usize = 64;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn check_concurrency(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must be greater than 0".into() });
    }
    if value > MAX_CONCURRENCY {
        return Err(ConfigError::Invalid { field: field.into(), reason: format!("must not exceed {MAX_CONCURRENCY}") });
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `favicon_concurrency` is 0 or exceeds 64
    /// - `favicon_timeout_ms` is less than 50ms or exceeds 60 seconds
    /// - `favicon_max_bytes` is 0 or exceeds 5MB
    /// - `statement_cache_capacity` is 0
    /// - `favicon_fallback_service` or `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_concurrency("favicon_concurrency", self.favicon_concurrency)?;

        if self.favicon_timeout_ms < 50 {
            return Err(ConfigError::Invalid {
                field: "favicon_timeout_ms".into(),
                reason: "must be at least 50ms".into(),
            });
        }
        if self.favicon_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "favicon_timeout_ms".into(),
                reason: "must not exceed 60 seconds (60000ms)".into(),
            });
        }

        if self.favicon_max_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "favicon_max_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.favicon_max_bytes > 5 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "favicon_max_bytes".into(), reason: "must not exceed 5MB".into() });
        }

        if self.statement_cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "statement_cache_capacity".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.favicon_fallback_service.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "favicon_fallback_service".into(),
                reason: "must not be empty".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.allow_duplicate_urls {
            tracing::debug!("duplicate URLs are allowed in saved tab lists");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_favicon_concurrency_zero() {
        let config = AppConfig { favicon_concurrency: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "favicon_concurrency"));
    }

    #[test]
    fn test_validate_favicon_concurrency_exceeds_limit() {
        let config = AppConfig { favicon_concurrency: 65, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "favicon_concurrency"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { favicon_timeout_ms: 10, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "favicon_timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { favicon_timeout_ms: 60_001, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "favicon_timeout_ms"));
    }

    #[test]
    fn test_validate_max_bytes_bounds() {
        let config = AppConfig { favicon_max_bytes: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "favicon_max_bytes"));

        let config = AppConfig { favicon_max_bytes: 6 * 1024 * 1024, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "favicon_max_bytes"));
    }

    #[test]
    fn test_validate_empty_strings() {
        let config = AppConfig { favicon_fallback_service: "  ".into(), ..Default::default() };
        assert!(
            matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "favicon_fallback_service")
        );

        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_zero_cache_capacity() {
        let config = AppConfig { statement_cache_capacity: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "statement_cache_capacity"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            favicon_concurrency: 64,
            favicon_timeout_ms: 50,
            favicon_max_bytes: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
