//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_API_URL` - Base URL of the storefront backend (e.g., `https://api.example.com/mobile`)
//! - `STOREFRONT_API_TOKEN` - Session access token for the backend
//!
//! ## Optional
//! - `STOREFRONT_CURRENCY` - ISO 4217 currency for telemetry values (default: USD)
//! - `STOREFRONT_REQUEST_TIMEOUT_SECS` - Backend request timeout (default: 30)
//! - `TELEMETRY_ENDPOINT` - Analytics collector URL (events are logged when unset)
//! - `TELEMETRY_API_KEY` - Analytics collector key
//! - `TELEMETRY_REQUEST_TIMEOUT_SECS` - Collector request timeout (default: 10)
//! - `TELEMETRY_DELAY_MS` - Delay before each event is sent (default: 50)
//! - `TELEMETRY_QUEUE_CAPACITY` - Events buffered before new ones are dropped (default: 256)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use cartkit_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Storefront backend connection
    pub remote: RemoteConfig,
    /// Currency used for telemetry values
    pub currency: CurrencyCode,
    /// Telemetry delivery settings
    pub telemetry: TelemetryConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Storefront backend configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct RemoteConfig {
    /// Base URL of the cart and wishlist endpoints
    pub base_url: Url,
    /// Bearer token for the current session
    pub api_token: SecretString,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Telemetry configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct TelemetryConfig {
    /// Collector URL; events are only logged when unset
    pub endpoint: Option<Url>,
    /// Collector API key
    pub api_key: Option<SecretString>,
    /// Per-request timeout for the collector
    pub request_timeout: Duration,
    /// Delay before each event is sent
    pub delay: Duration,
    /// Events buffered before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            request_timeout: Duration::from_secs(10),
            delay: Duration::from_millis(50),
            queue_capacity: 256,
        }
    }
}

impl std::fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("endpoint", &self.endpoint.as_ref().map(Url::as_str))
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("delay", &self.delay)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let remote = RemoteConfig::from_env()?;
        let currency = parse_env_or_default("STOREFRONT_CURRENCY", CurrencyCode::USD)?;
        let telemetry = TelemetryConfig::from_env()?;

        Ok(Self {
            remote,
            currency,
            telemetry,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl RemoteConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_url("STOREFRONT_API_URL")?;
        let api_token = get_validated_secret("STOREFRONT_API_TOKEN")?;
        let timeout_secs: u64 = parse_env_or_default("STOREFRONT_REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            base_url,
            api_token,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl TelemetryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let endpoint = get_optional_env("TELEMETRY_ENDPOINT")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("TELEMETRY_ENDPOINT".to_string(), e.to_string())
                })
            })
            .transpose()?;
        let api_key = get_optional_env("TELEMETRY_API_KEY").map(SecretString::from);
        let timeout_secs: u64 = parse_env_or_default(
            "TELEMETRY_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;
        let delay_ms: u64 = parse_env_or_default(
            "TELEMETRY_DELAY_MS",
            u64::try_from(defaults.delay.as_millis()).unwrap_or(50),
        )?;
        let queue_capacity = parse_env_or_default("TELEMETRY_QUEUE_CAPACITY", defaults.queue_capacity)?;

        Ok(Self {
            endpoint,
            api_key,
            request_timeout: Duration::from_secs(timeout_secs),
            delay: Duration::from_millis(delay_ms),
            queue_capacity,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable parsed as a URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let raw = get_required_env(key)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real access tokens are random; low entropy means someone typed it by hand
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by the backend."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
