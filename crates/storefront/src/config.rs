//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ANNYA_API_URL` - Backend base URL (default: `http://localhost:8006/api`)
//! - `ANNYA_API_TOKEN` - Bearer credential for order submission
//! - `ANNYA_STATE_DIR` - Directory holding the durable cart state (default: `.annya`)
//! - `ANNYA_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `ANNYA_RESERVATION_TTL_SECS` - Reservation hold window (default: 300)
//! - `ANNYA_CART_SAVE_DEBOUNCE_MS` - Quiet period before an abandoned-cart save (default: 2000)
//! - `ANNYA_FREE_SHIPPING_THRESHOLD` - Discounted subtotal above which shipping is free (default: 5000)
//! - `ANNYA_SHIPPING_FEE` - Flat shipping fee below the threshold (default: 100)
//! - `ANNYA_IDEMPOTENCY_SCOPE` - `view` or `reservation` (default: `view`)
//! - `ANNYA_RESERVATION_POLICY` - `advisory` or `enforce` (default: `advisory`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::checkout::ShippingPolicy;

const DEFAULT_API_URL: &str = "http://localhost:8006/api";
const DEFAULT_STATE_DIR: &str = ".annya";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RESERVATION_TTL_SECS: i64 = 300;
const MAX_RESERVATION_TTL_SECS: i64 = 24 * 60 * 60;
const DEFAULT_CART_SAVE_DEBOUNCE_MS: u64 = 2000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend connection settings
    pub api: ApiConfig,
    /// Directory for the durable key-value store
    pub state_dir: PathBuf,
    /// Checkout behaviour
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Backend connection settings.
///
/// Implements `Debug` manually to redact the credential.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Bearer credential for order submission
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Settings for `base_url` with the default timeout and no credential.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// How long a checkout idempotency key lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyScope {
    /// A fresh key every time the checkout view mounts.
    #[default]
    View,
    /// One key per reservation window, persisted across re-mounts.
    Reservation,
}

impl FromStr for KeyScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(Self::View),
            "reservation" => Ok(Self::Reservation),
            other => Err(format!("expected 'view' or 'reservation', got '{other}'")),
        }
    }
}

/// What happens when an order is submitted after the reservation window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// The countdown is informational; submission is still allowed.
    #[default]
    Advisory,
    /// Submission is refused once the window has elapsed.
    Enforce,
}

impl FromStr for ExpiryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "advisory" => Ok(Self::Advisory),
            "enforce" => Ok(Self::Enforce),
            other => Err(format!("expected 'advisory' or 'enforce', got '{other}'")),
        }
    }
}

/// Checkout behaviour.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Reservation hold window
    pub reservation_ttl: chrono::Duration,
    /// Quiet period before an abandoned-cart snapshot is sent
    pub cart_save_debounce: Duration,
    /// Shipping fee rules
    pub shipping: ShippingPolicy,
    /// Idempotency key lifetime
    pub key_scope: KeyScope,
    /// Reservation expiry handling at submission
    pub expiry_policy: ExpiryPolicy,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            reservation_ttl: chrono::Duration::seconds(DEFAULT_RESERVATION_TTL_SECS),
            cart_save_debounce: Duration::from_millis(DEFAULT_CART_SAVE_DEBOUNCE_MS),
            shipping: ShippingPolicy::default(),
            key_scope: KeyScope::default(),
            expiry_policy: ExpiryPolicy::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("ANNYA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ANNYA_API_URL".to_string(), e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "ANNYA_API_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let request_timeout: u64 = parse_or(
            get("ANNYA_REQUEST_TIMEOUT_SECS"),
            "ANNYA_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let api = ApiConfig {
            base_url,
            token: get("ANNYA_API_TOKEN").map(SecretString::from),
            request_timeout: Duration::from_secs(request_timeout),
        };

        let ttl_secs: i64 = parse_or(
            get("ANNYA_RESERVATION_TTL_SECS"),
            "ANNYA_RESERVATION_TTL_SECS",
            DEFAULT_RESERVATION_TTL_SECS,
        )?;
        let reservation_ttl = chrono::Duration::try_seconds(ttl_secs)
            .filter(|_| (1..=MAX_RESERVATION_TTL_SECS).contains(&ttl_secs))
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "ANNYA_RESERVATION_TTL_SECS".to_string(),
                    format!("must be between 1 and {MAX_RESERVATION_TTL_SECS} seconds"),
                )
            })?;

        let debounce_ms: u64 = parse_or(
            get("ANNYA_CART_SAVE_DEBOUNCE_MS"),
            "ANNYA_CART_SAVE_DEBOUNCE_MS",
            DEFAULT_CART_SAVE_DEBOUNCE_MS,
        )?;

        let defaults = ShippingPolicy::default();
        let shipping = ShippingPolicy {
            free_shipping_threshold: parse_amount(
                get("ANNYA_FREE_SHIPPING_THRESHOLD"),
                "ANNYA_FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            )?,
            shipping_fee: parse_amount(
                get("ANNYA_SHIPPING_FEE"),
                "ANNYA_SHIPPING_FEE",
                defaults.shipping_fee,
            )?,
        };

        let checkout = CheckoutConfig {
            reservation_ttl,
            cart_save_debounce: Duration::from_millis(debounce_ms),
            shipping,
            key_scope: parse_or(
                get("ANNYA_IDEMPOTENCY_SCOPE"),
                "ANNYA_IDEMPOTENCY_SCOPE",
                KeyScope::default(),
            )?,
            expiry_policy: parse_or(
                get("ANNYA_RESERVATION_POLICY"),
                "ANNYA_RESERVATION_POLICY",
                ExpiryPolicy::default(),
            )?,
        };

        Ok(Self {
            api,
            state_dir: PathBuf::from(
                get("ANNYA_STATE_DIR").unwrap_or_else(|| DEFAULT_STATE_DIR.to_string()),
            ),
            checkout,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional value, falling back to `default` when absent.
fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.map_or(Ok(default), |v| {
        v.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a non-negative money amount.
fn parse_amount(value: Option<String>, key: &str, default: Decimal) -> Result<Decimal, ConfigError> {
    let amount = parse_or(value, key, default)?;
    if amount.is_sign_negative() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be negative".to_string(),
        ));
    }
    Ok(amount)
}
