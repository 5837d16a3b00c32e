//! Configuration validation rules.
//!
//! Validation runs after loading, over values merged from environment,
//! file, and defaults.

use crate::config::EngineConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl EngineConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL with a host
    /// - `build_id` is empty
    /// - `shell_path` or any precache path is not root-relative
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = url::Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {}", origin.scheme()),
            });
        }
        if origin.host_str().is_none() {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must have a host".into() });
        }

        if self.build_id.is_empty() {
            return Err(ConfigError::Invalid { field: "build_id".into(), reason: "must not be empty".into() });
        }

        if !self.shell_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "shell_path".into(),
                reason: "must be root-relative (start with /)".into(),
            });
        }
        for path in &self.precache_paths {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid {
                    field: "precache_paths".into(),
                    reason: format!("'{path}' must be root-relative (start with /)"),
                });
            }
        }

        if !self.precache_paths.contains(&self.shell_path) {
            tracing::warn!(
                shell_path = %self.shell_path,
                "shell_path is not in precache_paths; the offline navigation \
                 fallback will only work after a successful runtime capture"
            );
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        Ok(())
    }
}
