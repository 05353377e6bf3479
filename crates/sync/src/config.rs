//! Sync configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ERP_URL` - ERP JSON-RPC endpoint (e.g. `https://erp.acme.io/jsonrpc`)
//! - `ERP_DATABASE` - ERP database name
//! - `ERP_LOGIN` - ERP user that owns the API key
//! - `ERP_API_KEY` - ERP API key (HIGH PRIVILEGE)
//!
//! ## Optional
//! - `ERP_TIMEOUT_SECS` - Per-call timeout (default: 30)
//! - `ERP_PRODUCT_LIMIT` - Default product listing size (default: 20)
//! - `ERP_MODULE_LIMIT` - Default module listing size (default: 50)
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `json` for structured log lines, anything else for text
//!
//! None of the four ERP settings has a default. Values that look like the
//! sample configuration (`your_db`, `user@example.com`, `your_api_key_here`)
//! are rejected instead of being sent to a real server.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PRODUCT_LIMIT: u32 = 20;
const DEFAULT_MODULE_LIMIT: u32 = 50;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Placeholder words for non-secret settings, matched against whole tokens
/// so `replacement_parts` or `todolist` stay valid database names.
const PLACEHOLDER_TOKENS: &[&str] = &[
    "your",
    "changeme",
    "replace",
    "replaceme",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
];

/// Additional patterns only checked for secrets.
const SECRET_PLACEHOLDER_PATTERNS: &[&str] = &["secret", "password", "api_key", "api-key"];

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

/// Full sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// ERP endpoint and credentials
    pub erp: ErpConfig,
    /// Storefront `PostgreSQL` URL (only needed for imports and migrations)
    pub storefront_database_url: Option<SecretString>,
}

/// Logging and error-tracking settings.
///
/// Loaded independently of [`SyncConfig`] so that commands which never talk
/// to the ERP (`migrate`) still get telemetry.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Emit JSON log lines instead of text
    pub json_logs: bool,
}

/// ERP JSON-RPC endpoint configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ErpConfig {
    url: Url,
    database: String,
    login: String,
    api_key: SecretString,
    timeout: Duration,
    product_limit: u32,
    module_limit: u32,
}

impl std::fmt::Debug for ErpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErpConfig")
            .field("url", &self.url.as_str())
            .field("database", &self.database)
            .field("login", &self.login)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("product_limit", &self.product_limit)
            .field("module_limit", &self.module_limit)
            .finish()
    }
}

impl ErpConfig {
    /// Build a validated ERP configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any value is empty, the URL is not an absolute
    /// http(s) URL, or a value looks like a placeholder.
    pub fn new(
        url: &str,
        database: &str,
        login: &str,
        api_key: SecretString,
    ) -> Result<Self, ConfigError> {
        let url = validate_endpoint_url(url, "ERP_URL")?;
        validate_plain_value(database, "ERP_DATABASE")?;
        validate_plain_value(login, "ERP_LOGIN")?;
        validate_secret_strength(api_key.expose_secret(), "ERP_API_KEY")?;

        Ok(Self {
            url,
            database: database.to_string(),
            login: login.to_string(),
            api_key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            product_limit: DEFAULT_PRODUCT_LIMIT,
            module_limit: DEFAULT_MODULE_LIMIT,
        })
    }

    /// Override the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the default listing sizes.
    #[must_use]
    pub const fn with_limits(mut self, product_limit: u32, module_limit: u32) -> Self {
        self.product_limit = product_limit;
        self.module_limit = module_limit;
        self
    }

    /// JSON-RPC endpoint.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// ERP database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// ERP login.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// ERP API key.
    #[must_use]
    pub const fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// Per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Default number of products returned by a listing.
    #[must_use]
    pub const fn product_limit(&self) -> u32 {
        self.product_limit
    }

    /// Default number of modules returned by a listing.
    #[must_use]
    pub const fn module_limit(&self) -> u32 {
        self.module_limit
    }

    fn from_source(source: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = get_required(source, "ERP_URL")?;
        let database = get_required(source, "ERP_DATABASE")?;
        let login = get_required(source, "ERP_LOGIN")?;
        let api_key = SecretString::from(get_required(source, "ERP_API_KEY")?);

        let timeout_secs = parse_positive(source, "ERP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let product_limit = parse_positive(source, "ERP_PRODUCT_LIMIT", DEFAULT_PRODUCT_LIMIT)?;
        let module_limit = parse_positive(source, "ERP_MODULE_LIMIT", DEFAULT_MODULE_LIMIT)?;

        Ok(Self::new(&url, &database, &login, api_key)?
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_limits(product_limit, module_limit))
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if values fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    fn from_source(source: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let erp = ErpConfig::from_source(source)?;

        Ok(Self {
            erp,
            storefront_database_url: database_url(source),
        })
    }

    /// Returns the storefront database URL, required for imports and migrations.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if neither `STOREFRONT_DATABASE_URL`
    /// nor `DATABASE_URL` was set.
    pub fn storefront_database_url(&self) -> Result<&SecretString, ConfigError> {
        self.storefront_database_url
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))
    }
}

impl TelemetryConfig {
    /// Load telemetry settings from environment variables. Never fails.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self::from_source(&|key| std::env::var(key).ok())
    }

    fn from_source(source: &impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| source(key).filter(|v: &String| !v.trim().is_empty());

        Self {
            sentry_dsn: non_blank("SENTRY_DSN"),
            sentry_environment: non_blank("SENTRY_ENVIRONMENT"),
            json_logs: source("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }
}

/// Load only the storefront database URL, for commands that do not need the ERP.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither `STOREFRONT_DATABASE_URL`
/// nor `DATABASE_URL` is set.
pub fn storefront_database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();

    database_url(&|key| std::env::var(key).ok())
        .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Storefront database URL, falling back to the generic `DATABASE_URL`
/// (set by Fly.io postgres attach).
fn database_url(source: &impl Fn(&str) -> Option<String>) -> Option<SecretString> {
    source("STOREFRONT_DATABASE_URL")
        .or_else(|| source("DATABASE_URL"))
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Get a required, non-blank value.
fn get_required(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    source(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an optional strictly positive integer, falling back to `default`.
fn parse_positive<T>(
    source: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let Some(raw) = source(key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if value <= T::default() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}

/// Find the first placeholder pattern contained in `value`.
fn find_placeholder<'a>(value: &str, patterns: &[&'a str]) -> Option<&'a str> {
    let lower = value.to_lowercase();
    patterns.iter().copied().find(|pattern| lower.contains(pattern))
}

/// Find the first placeholder word appearing as a whole token of `value`.
///
/// Tokens are the runs of alphanumeric characters, so `user@example.com`
/// yields `user`, `example` and `com`.
fn find_placeholder_token(value: &str) -> Option<&'static str> {
    let lower = value.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .find_map(|token| PLACEHOLDER_TOKENS.iter().copied().find(|word| *word == token))
}

/// Validate a non-secret setting: non-blank and not a placeholder.
fn validate_plain_value(value: &str, var_name: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }
    if let Some(word) = find_placeholder_token(value) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{word}')"),
        ));
    }
    Ok(())
}

/// Parse and validate the ERP endpoint URL.
fn validate_endpoint_url(raw: &str, var_name: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }

    let Some(host) = url.host_str() else {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "URL has no host".to_string(),
        ));
    };

    if let Some(pattern) = find_placeholder(host, PLACEHOLDER_PATTERNS) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("host appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    Ok(url)
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
    let len = s.chars().count() as f64;
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
    if secret.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }

    if let Some(pattern) = find_placeholder(secret, PLACEHOLDER_PATTERNS)
        .or_else(|| find_placeholder(secret, SECRET_PLACEHOLDER_PATTERNS))
    {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the API key generated by the ERP."
            ),
        ));
    }

    Ok(())
}
