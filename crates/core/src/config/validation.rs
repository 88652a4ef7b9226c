//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Shortest accepted cache secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 10MB
    /// - `timeout_ms` is less than 100ms or exceeds 2 minutes
    /// - `connect_timeout_ms` is 0 or exceeds `timeout_ms`
    /// - `max_redirects` exceeds 20
    /// - `ttl_secs` is 0
    /// - `user_agent` is empty
    /// - `secret_key` is set but shorter than 16 bytes
    /// - `fallback_api` has no `{}` placeholder
    /// - a `file_map` pattern is not a valid regex
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 10 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 10MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 120_000 {
            return Err(invalid("timeout_ms", "must not exceed 2 minutes (120000ms)"));
        }
        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > self.timeout_ms {
            return Err(invalid("connect_timeout_ms", "must be between 1 and timeout_ms"));
        }

        if self.max_redirects > 20 {
            return Err(invalid("max_redirects", "must not exceed 20"));
        }

        if self.ttl_secs == 0 {
            return Err(invalid("ttl_secs", "must be greater than 0"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if let Some(secret) = &self.secret_key
            && secret.len() < MIN_SECRET_LEN
        {
            return Err(invalid("secret_key", "must be at least 16 bytes"));
        }

        if !self.fallback_api.contains("{}") {
            return Err(invalid("fallback_api", "must contain a {} placeholder for the host root"));
        }

        for (index, rule) in self.file_map.iter().enumerate() {
            if let Err(e) = regex::Regex::new(&rule.pattern) {
                return Err(ConfigError::Invalid { field: format!("file_map[{index}].pattern"), reason: e.to_string() });
            }
            if rule.target.trim().is_empty() {
                return Err(invalid(&format!("file_map[{index}].target"), "must not be empty"));
            }
        }

        if !self.accept_invalid_certs {
            tracing::debug!("TLS certificate validation enabled for origin fetches");
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}
