//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TABLESIDE_API_URL` - Base URL of the backend REST API (e.g. `https://api.example.com/api`)
//!
//! ## Optional
//! - `TABLESIDE_WS_URL` - Real-time endpoint (default: API origin with `ws`/`wss` scheme and path `/ws`)
//! - `TABLESIDE_STOREFRONT_URL` - Public customer URL, used for QR links and payment redirects (default: `http://localhost:5173`)
//! - `TABLESIDE_DATA_DIR` - Directory for durable client state (default: `.tableside`)
//! - `TABLESIDE_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `TABLESIDE_CACHE_TTL_SECS` - Public GET cache lifetime (default: 30)
//! - `TABLESIDE_WS_MAX_ATTEMPTS` - Consecutive handshake attempts before giving up (default: 5)
//! - `TABLESIDE_WS_RECONNECT_BASE_MS` - Base reconnect delay (default: 3000)
//! - `TABLESIDE_WS_HANDSHAKE_TIMEOUT_SECS` - Handshake timeout (default: 10)
//! - `TABLESIDE_POLL_INTERVAL_SECS` - Unread-count polling interval while offline (default: 30)
//! - `TABLESIDE_POLL_GRACE_SECS` - Offline time before polling starts (default: 5)
//! - `TABLESIDE_LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `TOSS_CLIENT_KEY` - Payment widget client key
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::realtime::ChannelConfig;

const DEFAULT_STOREFRONT_URL: &str = "http://localhost:5173";
const DEFAULT_DATA_DIR: &str = ".tableside";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for REST calls; endpoint paths are appended verbatim.
    pub api_url: Url,
    /// Real-time endpoint.
    pub ws_url: Url,
    /// Public customer-facing URL.
    pub storefront_url: Url,
    /// Directory for durable client state.
    pub data_dir: PathBuf,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Lifetime of cached public GET responses.
    pub cache_ttl: Duration,
    /// Real-time channel tuning.
    pub channel: ChannelConfig,
    /// Payment widget configuration (optional; checkout is disabled without it).
    pub payment: Option<PaymentConfig>,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Payment widget configuration.
///
/// Implements `Debug` manually to redact the client key.
#[derive(Clone)]
pub struct PaymentConfig {
    pub client_key: SecretString,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("client_key", &"[REDACTED]")
            .finish()
    }
}

impl ClientConfig {
    /// Configuration with every optional setting at its default.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        let ws_url = derive_ws_url(&api_url);
        let storefront_url = Url::parse(DEFAULT_STOREFRONT_URL)
            .unwrap_or_else(|_| api_url.clone());
        Self {
            api_url,
            ws_url,
            storefront_url,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(30),
            channel: ChannelConfig::default(),
            payment: None,
            log_format: LogFormat::Text,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_url("TABLESIDE_API_URL", &get_required_env("TABLESIDE_API_URL")?)?;
        let mut config = Self::new(api_url);

        if let Some(raw) = get_optional_env("TABLESIDE_WS_URL") {
            config.ws_url = parse_url("TABLESIDE_WS_URL", &raw)?;
        }
        config.storefront_url = parse_url(
            "TABLESIDE_STOREFRONT_URL",
            &get_env_or_default("TABLESIDE_STOREFRONT_URL", DEFAULT_STOREFRONT_URL),
        )?;
        config.data_dir = PathBuf::from(get_env_or_default("TABLESIDE_DATA_DIR", DEFAULT_DATA_DIR));
        config.request_timeout = Duration::from_secs(parse_env("TABLESIDE_REQUEST_TIMEOUT_SECS", 10)?);
        config.cache_ttl = Duration::from_secs(parse_env("TABLESIDE_CACHE_TTL_SECS", 30)?);

        let defaults = ChannelConfig::default();
        config.channel = ChannelConfig {
            max_attempts: parse_env("TABLESIDE_WS_MAX_ATTEMPTS", defaults.max_attempts)?,
            reconnect_base: Duration::from_millis(parse_env(
                "TABLESIDE_WS_RECONNECT_BASE_MS",
                3000,
            )?),
            handshake_timeout: Duration::from_secs(parse_env(
                "TABLESIDE_WS_HANDSHAKE_TIMEOUT_SECS",
                10,
            )?),
            poll_interval: Duration::from_secs(parse_env("TABLESIDE_POLL_INTERVAL_SECS", 30)?),
            poll_grace: Duration::from_secs(parse_env("TABLESIDE_POLL_GRACE_SECS", 5)?),
            event_capacity: defaults.event_capacity,
        };
        if config.channel.max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "TABLESIDE_WS_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        config.payment = get_optional_env("TOSS_CLIENT_KEY").map(|key| PaymentConfig {
            client_key: SecretString::from(key),
        });
        config.log_format = match get_optional_env("TABLESIDE_LOG_FORMAT").as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        config.sentry_dsn = get_optional_env("SENTRY_DSN");
        config.sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(config)
    }

    /// Customer menu URL encoded into a seat's QR code.
    #[must_use]
    pub fn seat_url(&self, qr_code: &str) -> String {
        let mut url = self.storefront_url.clone();
        url.set_path(&format!("/menu/{qr_code}"));
        url.to_string()
    }
}

/// Derive the real-time endpoint from the REST base URL.
///
/// `http` becomes `ws`, `https` becomes `wss`; the path is replaced with
/// `/ws` and any query is dropped.
#[must_use]
pub fn derive_ws_url(api_url: &Url) -> Url {
    let mut ws = api_url.clone();
    let scheme = if api_url.scheme() == "https" { "wss" } else { "ws" };
    // http(s) -> ws(s) is an allowed special-scheme change.
    let _ = ws.set_scheme(scheme);
    ws.set_path("/ws");
    ws.set_query(None);
    ws.set_fragment(None);
    ws
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an optional numeric environment variable.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
