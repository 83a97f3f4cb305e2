//! Service configuration loaded from environment variables.
//!
//! Configuration is an explicit object injected into the service at
//! startup and passed to each component that needs it - never ambient
//! global state.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DIGEST_SHARED_SECRET` - Signs confirm/unsubscribe tokens and gates
//!   the internal endpoints (min 32 chars, high entropy)
//! - `DIGEST_BASE_URL` - Public origin used to build confirmation links
//!
//! ## Optional
//! - `DIGEST_HOST` - Bind address (default: 127.0.0.1)
//! - `DIGEST_PORT` - Listen port (default: 8787)
//! - `GITHUB_DISPATCH_TOKEN` / `GITHUB_DISPATCH_OWNER` /
//!   `GITHUB_DISPATCH_REPO` - Repository-dispatch target for verification
//!   emails; when unset, dispatches are recorded in memory and logged
//! - `KV_ACCOUNT_ID` / `KV_NAMESPACE_ID` / `KV_API_TOKEN` - Cloudflare KV
//!   namespace backing the subscriber list; when unset, an in-memory
//!   store is used
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_SHARED_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "insert",
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

/// Digest service configuration.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public origin for confirmation links
    pub base_url: Url,
    /// Shared signing/authorization secret
    pub shared_secret: SecretString,
    /// Repository-dispatch target for verification emails
    pub dispatch: Option<DispatchConfig>,
    /// Cloudflare KV namespace credentials
    pub kv: Option<KvConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Repository-dispatch target configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct DispatchConfig {
    /// API token authorized to fire `repository_dispatch` events
    pub token: SecretString,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
}

impl std::fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("token", &"[REDACTED]")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish()
    }
}

/// Cloudflare KV REST credentials.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct KvConfig {
    /// Cloudflare account ID
    pub account_id: String,
    /// KV namespace ID
    pub namespace_id: String,
    /// API token with KV read/write access
    pub api_token: SecretString,
}

impl std::fmt::Debug for KvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvConfig")
            .field("account_id", &self.account_id)
            .field("namespace_id", &self.namespace_id)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl DigestConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the shared secret fails validation (length, placeholder
    /// detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("DIGEST_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DIGEST_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DIGEST_PORT", "8787")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DIGEST_PORT".to_string(), e.to_string()))?;
        let base_url = Url::parse(&get_required_env("DIGEST_BASE_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("DIGEST_BASE_URL".to_string(), e.to_string())
        })?;

        let shared_secret = get_validated_secret("DIGEST_SHARED_SECRET")?;
        validate_secret_length(&shared_secret, "DIGEST_SHARED_SECRET")?;

        Ok(Self {
            host,
            port,
            base_url,
            shared_secret,
            dispatch: DispatchConfig::from_env()?,
            kv: KvConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DispatchConfig {
    /// Load the dispatch target if all three variables are present.
    ///
    /// A partially configured target is an error rather than a silent
    /// fallback to the in-memory dispatcher.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let token = get_optional_env("GITHUB_DISPATCH_TOKEN");
        let owner = get_optional_env("GITHUB_DISPATCH_OWNER");
        let repo = get_optional_env("GITHUB_DISPATCH_REPO");

        match (token, owner, repo) {
            (Some(token), Some(owner), Some(repo)) => Ok(Some(Self {
                token: SecretString::from(token),
                owner,
                repo,
            })),
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::MissingEnvVar(
                "GITHUB_DISPATCH_TOKEN/OWNER/REPO must be set together".to_string(),
            )),
        }
    }
}

impl KvConfig {
    /// Load the KV credentials if all three variables are present.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let account_id = get_optional_env("KV_ACCOUNT_ID");
        let namespace_id = get_optional_env("KV_NAMESPACE_ID");
        let api_token = get_optional_env("KV_API_TOKEN");

        match (account_id, namespace_id, api_token) {
            (Some(account_id), Some(namespace_id), Some(api_token)) => Ok(Some(Self {
                account_id,
                namespace_id,
                api_token: SecretString::from(api_token),
            })),
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::MissingEnvVar(
                "KV_ACCOUNT_ID/NAMESPACE_ID/API_TOKEN must be set together".to_string(),
            )),
        }
    }
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
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the shared secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SHARED_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SHARED_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
            #[allow(clippy::cast_precision_loss)]
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

    // Real secrets are randomly generated and have high entropy. A leaked
    // or guessable shared secret makes every emailed link forgeable.
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
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
