//! Engine configuration with layered loading.
//!
//! Configuration is loaded with figment from multiple sources:
//!
//! 1. Environment variables (UMBRA_*)
//! 2. TOML config file (if UMBRA_CONFIG_FILE set)
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

/// Engine configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (UMBRA_*)
/// 2. TOML config file (if UMBRA_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path to the SQLite database backing all cache stores.
    ///
    /// Set via UMBRA_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// The engine's own origin, used for same-origin classification and for
    /// resolving root-relative precache paths.
    ///
    /// Set via UMBRA_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Build identifier embedded in the precache store name, so every deploy
    /// gets a fresh precache store. Defaults to the crate version; override
    /// per deploy via UMBRA_BUILD_ID.
    #[serde(default = "default_build_id")]
    pub build_id: String,

    /// Root-relative path of the app shell document served as the offline
    /// fallback for navigations.
    ///
    /// Set via UMBRA_SHELL_PATH environment variable.
    #[serde(default = "default_shell_path")]
    pub shell_path: String,

    /// Root-relative paths fetched into the precache store at install time.
    ///
    /// Set via UMBRA_PRECACHE_PATHS environment variable (comma-separated).
    #[serde(default = "default_precache_paths")]
    pub precache_paths: Vec<String>,

    /// User-Agent string for outbound requests.
    ///
    /// Set via UMBRA_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read per response body.
    ///
    /// Set via UMBRA_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Outbound request timeout in milliseconds.
    ///
    /// Set via UMBRA_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    ///
    /// Set via UMBRA_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./umbra-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_build_id() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_shell_path() -> String {
    "/index.html".into()
}

fn default_precache_paths() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/manifest.json".into()]
}

fn default_user_agent() -> String {
    "umbra/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            build_id: default_build_id(),
            shell_path: default_shell_path(),
            precache_paths: default_precache_paths(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl EngineConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("UMBRA_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("UMBRA_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
