//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FAVCACHE_*)
//! 2. TOML config file (if FAVCACHE_CONFIG_FILE set)
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

/// A static host-to-icon override.
///
/// `pattern` is a regex matched against the normalized host root
/// (`scheme://host[:port]`). `target` is either an `http(s)://` URL or a
/// local file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapRule {
    pub pattern: String,
    pub target: String,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FAVCACHE_*)
/// 2. TOML config file (if FAVCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the edge service binds to.
    ///
    /// Set via FAVCACHE_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Root directory of the icon cache.
    ///
    /// Set via FAVCACHE_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Secret used to key cache file names.
    ///
    /// Set via FAVCACHE_SECRET_KEY environment variable. Required.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Placeholder icon served when every strategy fails.
    ///
    /// Set via FAVCACHE_DEFAULT_ICON environment variable.
    #[serde(default = "default_icon")]
    pub default_icon: PathBuf,

    /// Lifetime of cached real icons, in seconds.
    ///
    /// Set via FAVCACHE_TTL_SECS environment variable.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FAVCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Total HTTP request timeout in milliseconds.
    ///
    /// Set via FAVCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// TCP/TLS connect timeout in milliseconds.
    ///
    /// Set via FAVCACHE_CONNECT_TIMEOUT_MS environment variable.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum number of redirects followed per fetch.
    ///
    /// Set via FAVCACHE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Download size requested via the Range header.
    ///
    /// Set via FAVCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Skip TLS certificate validation for origin fetches.
    ///
    /// Set via FAVCACHE_ACCEPT_INVALID_CERTS environment variable.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    /// Favicon-by-domain endpoint; `{}` is replaced by the URL-encoded host root.
    ///
    /// Set via FAVCACHE_FALLBACK_API environment variable.
    #[serde(default = "default_fallback_api")]
    pub fallback_api: String,

    /// Static host overrides, tried in declaration order.
    #[serde(default)]
    pub file_map: Vec<FileMapRule>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./favcache-data")
}

fn default_icon() -> PathBuf {
    PathBuf::from("./default.ico")
}

fn default_ttl_secs() -> u64 {
    604_800 // 1 week
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_bytes() -> usize {
    1_048_576 // 1MB
}

fn default_true() -> bool {
    true
}

fn default_fallback_api() -> String {
    "https://www.google.com/s2/favicons?sz=64&domain_url={}".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cache_dir: default_cache_dir(),
            secret_key: None,
            default_icon: default_icon(),
            ttl_secs: default_ttl_secs(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_redirects: default_max_redirects(),
            max_bytes: default_max_bytes(),
            accept_invalid_certs: true,
            fallback_api: default_fallback_api(),
            file_map: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Total timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Lifetime of cached real icons.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FAVCACHE_`
    /// 2. TOML file from `FAVCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("FAVCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FAVCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The cache secret, or a `Missing` error with a hint.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the secret key is not set.
    pub fn require_secret_key(&self) -> Result<&str, ConfigError> {
        self.secret_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "secret_key".into(),
            hint: "Set FAVCACHE_SECRET_KEY environment variable".into(),
        })
    }

    /// Read the placeholder icon from disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the file cannot be read or is empty.
    pub fn load_default_icon(&self) -> Result<Vec<u8>, ConfigError> {
        let bytes = std::fs::read(&self.default_icon).map_err(|e| ConfigError::Invalid {
            field: "default_icon".into(),
            reason: format!("cannot read {}: {e}", self.default_icon.display()),
        })?;
        if bytes.is_empty() {
            return Err(ConfigError::Invalid { field: "default_icon".into(), reason: "file is empty".into() });
        }
        Ok(bytes)
    }
}
