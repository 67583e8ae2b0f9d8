//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `STOREFRONT_API_URL` - Base URL of the storefront REST API (default: `http://localhost:3000`)
//! - `STOREFRONT_STATE_PATH` - File holding the persisted session and cart slices
//!   (default: `.storefront-state.json`)
//! - `STOREFRONT_HTTP_TIMEOUT_SECS` - Per-request timeout (default: transport default)
//! - `STOREFRONT_PRODUCT_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `STOREFRONT_SEQUENTIAL_MUTATIONS` - Serialize cart/order mutations (default: false)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_STATE_PATH: &str = ".storefront-state.json";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is resolved against
    pub api_url: Url,
    /// Where [`crate::storage::FileStorage`] keeps durable state
    pub state_path: PathBuf,
    /// Request timeout; `None` keeps the transport default
    pub http_timeout: Option<Duration>,
    /// Time-to-live for cached catalog responses
    pub product_cache_ttl: Duration,
    /// Allow at most one in-flight mutation per store
    pub sequential_mutations: bool,
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with every other setting defaulted.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            http_timeout: None,
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            sequential_mutations: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("STOREFRONT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_API_URL".to_string(), e.to_string())
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_API_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let state_path = lookup("STOREFRONT_STATE_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_PATH), PathBuf::from);

        let http_timeout = lookup("STOREFRONT_HTTP_TIMEOUT_SECS")
            .map(|v| parse_secs("STOREFRONT_HTTP_TIMEOUT_SECS", &v))
            .transpose()?;

        let product_cache_ttl = lookup("STOREFRONT_PRODUCT_CACHE_TTL_SECS")
            .map(|v| parse_secs("STOREFRONT_PRODUCT_CACHE_TTL_SECS", &v))
            .transpose()?
            .unwrap_or(Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS));

        let sequential_mutations = lookup("STOREFRONT_SEQUENTIAL_MUTATIONS")
            .map(|v| parse_bool("STOREFRONT_SEQUENTIAL_MUTATIONS", &v))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            api_url,
            state_path,
            http_timeout,
            product_cache_ttl,
            sequential_mutations,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a whole number of seconds.
fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag (`true/false`, `1/0`, `yes/no`).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
