//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHOPHUB_CATALOG_URL` - Product catalog base URL (default: `https://dummyjson.com`)
//! - `SHOPHUB_CATALOG_CACHE_TTL_SECS` - Catalog response cache lifetime (default: 3600)
//! - `SHOPHUB_CATALOG_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SHOPHUB_CATALOG_MAX_RETRIES` - Retries for rate-limited or 5xx responses (default: 2)
//! - `SHOPHUB_DATA_DIR` - Directory holding the persisted session (default: `.shophub`)
//! - `SHOPHUB_SIMULATE_LATENCY` - Delay simulated login/signup/payment calls (default: true)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Product catalog client configuration
    pub catalog: CatalogConfig,
    /// Directory holding the persisted cart and user
    pub data_dir: PathBuf,
    /// Delays applied to simulated network calls
    pub latency: LatencyConfig,
}

/// Product catalog client configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API
    pub base_url: Url,
    /// How long successful responses stay cached
    pub cache_ttl: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after a rate-limited or 5xx response
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_backoff: Duration,
}

impl CatalogConfig {
    /// Default configuration pointing at `base_url`.
    #[must_use]
    pub const fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            cache_ttl: Duration::from_secs(3600),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// Delays applied to simulated network calls.
///
/// Login, signup, profile updates and payment are stand-ins for real
/// network calls; each resolves after a single fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyConfig {
    pub login: Duration,
    pub signup: Duration,
    pub profile_update: Duration,
    pub payment: Duration,
}

impl LatencyConfig {
    /// No delays at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            login: Duration::ZERO,
            signup: Duration::ZERO,
            profile_update: Duration::ZERO,
            payment: Duration::ZERO,
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            login: Duration::from_millis(1500),
            signup: Duration::from_millis(2000),
            profile_update: Duration::from_millis(1000),
            payment: Duration::from_millis(3000),
        }
    }
}

/// Wait out a simulated network delay.
pub async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

impl StorefrontConfig {
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
        let base_url = lookup("SHOPHUB_CATALOG_URL")
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOPHUB_CATALOG_URL".to_string(), e.to_string())
        })?;

        let mut catalog = CatalogConfig::with_base_url(base_url);
        catalog.cache_ttl = Duration::from_secs(parse_or(
            &lookup,
            "SHOPHUB_CATALOG_CACHE_TTL_SECS",
            catalog.cache_ttl.as_secs(),
        )?);
        catalog.timeout = Duration::from_secs(parse_or(
            &lookup,
            "SHOPHUB_CATALOG_TIMEOUT_SECS",
            catalog.timeout.as_secs(),
        )?);
        catalog.max_retries = parse_or(&lookup, "SHOPHUB_CATALOG_MAX_RETRIES", catalog.max_retries)?;

        let data_dir = lookup("SHOPHUB_DATA_DIR").map_or_else(|| PathBuf::from(".shophub"), PathBuf::from);

        let latency = if parse_or(&lookup, "SHOPHUB_SIMULATE_LATENCY", true)? {
            LatencyConfig::default()
        } else {
            LatencyConfig::none()
        };

        Ok(Self {
            catalog,
            data_dir,
            latency,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable if present, otherwise use `default`.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
