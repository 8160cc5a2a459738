//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BASKET_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BASKET_BASE_URL` - Public URL of the site, used for share links
//!
//! ## Optional
//! - `BASKET_HOST` - Bind address (default: 127.0.0.1)
//! - `BASKET_PORT` - Listen port (default: 3000)
//! - `BASKET_BLOB_BACKEND` - `local` or `http` (default: local)
//! - `BASKET_MEDIA_DIR` - Directory for the local backend (default: media)
//! - `BASKET_MEDIA_URL` - Public URL of that directory (default: `{base_url}/media`)
//! - `BASKET_BLOB_ENDPOINT` - Object store endpoint (http backend, required there)
//! - `BASKET_BLOB_TOKEN` - Object store bearer token (http backend, required there)
//! - `BASKET_BLOB_PUBLIC_URL` - Public URL of stored objects (http backend, default: endpoint)
//! - `BASKET_UPLOAD_FOLDER` - Key prefix for item images (default: `grocery_items`)
//! - `BASKET_MAX_UPLOAD_BYTES` - Request body limit (default: 5 MiB)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::blob::DEFAULT_UPLOAD_FOLDER;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

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

/// Server configuration.
#[derive(Debug, Clone)]
pub struct BasketConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used to build absolute share links
    pub base_url: Url,
    /// Where uploaded images go
    pub blob: BlobConfig,
    /// Key prefix for uploaded item images
    pub upload_folder: String,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

/// Blob store backend selection.
///
/// Implements `Debug` manually to redact the object store token.
#[derive(Clone)]
pub enum BlobConfig {
    /// Files on local disk, served by this process under `/media`.
    Local {
        /// Directory files are written to
        media_dir: PathBuf,
        /// Public URL the directory is reachable at
        public_url: String,
    },
    /// An HTTP object store accepting `PUT`/`DELETE` with a bearer token.
    Http {
        /// Base URL objects are written to
        endpoint: Url,
        /// Bearer token for writes and deletes
        token: SecretString,
        /// Public URL objects are reachable at
        public_url: String,
    },
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local {
                media_dir,
                public_url,
            } => f
                .debug_struct("Local")
                .field("media_dir", media_dir)
                .field("public_url", public_url)
                .finish(),
            Self::Http {
                endpoint,
                public_url,
                ..
            } => f
                .debug_struct("Http")
                .field("endpoint", &endpoint.as_str())
                .field("token", &"[REDACTED]")
                .field("public_url", public_url)
                .finish(),
        }
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when absent
    pub dsn: Option<String>,
    /// Environment name reported with events
    pub environment: Option<String>,
    /// Fraction of errors sent
    pub sample_rate: f32,
    /// Fraction of transactions sent
    pub traces_sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        }
    }
}

impl BasketConfig {
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

        let database_url = get_database_url("BASKET_DATABASE_URL")?;
        let host = get_env_or_default("BASKET_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BASKET_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BASKET_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BASKET_PORT".to_string(), e.to_string()))?;
        let base_url = parse_url("BASKET_BASE_URL", &get_required_env("BASKET_BASE_URL")?)?;
        let blob = BlobConfig::from_env(&base_url)?;
        let upload_folder = get_env_or_default("BASKET_UPLOAD_FOLDER", DEFAULT_UPLOAD_FOLDER);
        let max_upload_bytes = match get_optional_env("BASKET_MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidEnvVar("BASKET_MAX_UPLOAD_BYTES".to_string(), e.to_string())
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            blob,
            upload_folder,
            max_upload_bytes,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (controls the `Secure` cookie flag).
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Absolute URL for a site-relative path.
    #[must_use]
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl BlobConfig {
    fn from_env(base_url: &Url) -> Result<Self, ConfigError> {
        match get_env_or_default("BASKET_BLOB_BACKEND", "local").as_str() {
            "local" => Ok(Self::Local {
                media_dir: PathBuf::from(get_env_or_default("BASKET_MEDIA_DIR", "media")),
                public_url: get_optional_env("BASKET_MEDIA_URL")
                    .unwrap_or_else(|| default_media_url(base_url)),
            }),
            "http" => {
                let endpoint = parse_url(
                    "BASKET_BLOB_ENDPOINT",
                    &get_required_env("BASKET_BLOB_ENDPOINT")?,
                )?;
                let token = get_validated_secret("BASKET_BLOB_TOKEN")?;
                let public_url = get_optional_env("BASKET_BLOB_PUBLIC_URL")
                    .unwrap_or_else(|| endpoint.as_str().trim_end_matches('/').to_string());
                Ok(Self::Http {
                    endpoint,
                    token,
                    public_url,
                })
            }
            other => Err(ConfigError::InvalidEnvVar(
                "BASKET_BLOB_BACKEND".to_string(),
                format!("expected 'local' or 'http', got '{other}'"),
            )),
        }
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: get_optional_rate("SENTRY_SAMPLE_RATE")?.unwrap_or(defaults.sample_rate),
            traces_sample_rate: get_optional_rate("SENTRY_TRACES_SAMPLE_RATE")?
                .unwrap_or(defaults.traces_sample_rate),
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

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an optional sample rate in `0.0..=1.0`.
fn get_optional_rate(key: &str) -> Result<Option<f32>, ConfigError> {
    get_optional_env(key)
        .map(|raw| parse_rate(key, &raw))
        .transpose()
}

fn parse_rate(key: &str, raw: &str) -> Result<f32, ConfigError> {
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be an http(s) URL (got scheme '{}')", url.scheme()),
        ));
    }
    Ok(url)
}

fn default_media_url(base_url: &Url) -> String {
    format!("{}/media", base_url.as_str().trim_end_matches('/'))
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> BasketConfig {
        BasketConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse(base_url).unwrap(),
            blob: BlobConfig::Local {
                media_dir: PathBuf::from("media"),
                public_url: "http://localhost:3000/media".to_string(),
            },
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            sentry: SentryConfig::default(),
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-blob-token-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_rate_bounds() {
        assert!((parse_rate("R", "0.25").unwrap() - 0.25).abs() < f32::EPSILON);
        assert!(parse_rate("R", "1.5").is_err());
        assert!(parse_rate("R", "-0.1").is_err());
        assert!(parse_rate("R", "often").is_err());
    }

    #[test]
    fn test_parse_url_requires_http() {
        assert!(parse_url("U", "https://basket.example.org").is_ok());
        assert!(parse_url("U", "ftp://basket.example.org").is_err());
        assert!(parse_url("U", "not a url").is_err());
    }

    #[test]
    fn test_default_media_url() {
        let base = Url::parse("https://basket.example.org/").unwrap();
        assert_eq!(default_media_url(&base), "https://basket.example.org/media");
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_absolute_url_and_https() {
        let plain = config("http://localhost:3000");
        assert!(!plain.is_https());
        assert_eq!(
            plain.absolute_url("/share/abc"),
            "http://localhost:3000/share/abc"
        );

        let secure = config("https://basket.example.org/");
        assert!(secure.is_https());
        assert_eq!(
            secure.absolute_url("/share/abc"),
            "https://basket.example.org/share/abc"
        );
    }

    #[test]
    fn test_blob_config_debug_redacts_token() {
        let blob = BlobConfig::Http {
            endpoint: Url::parse("https://objects.internal/bucket").unwrap(),
            token: SecretString::from("super_private_token_value"),
            public_url: "https://cdn.internal/bucket".to_string(),
        };

        let debug_output = format!("{blob:?}");
        assert!(debug_output.contains("objects.internal"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_private_token_value"));
    }
}
