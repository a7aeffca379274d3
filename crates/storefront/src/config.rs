//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `ECOTREND_HOST` - Bind address (default: 127.0.0.1)
//! - `ECOTREND_PORT` - Listen port (default: 3000)
//! - `ECOTREND_BASE_URL` - Public URL; `https://` enables secure cookies
//!   (default: `http://localhost:3000`)
//! - `ECOTREND_CATALOG_SOURCE` - Product feed, an `http(s)://` URL or a file
//!   path (default: `crates/storefront/static/products.json`)
//! - `ECOTREND_DATA_DIR` - Directory for persisted carts (default: `data`)
//! - `ECOTREND_CHECKOUT_DELAY_MS` - Simulated payment delay (default: 1500)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default location of the bundled product feed.
pub const DEFAULT_CATALOG_SOURCE: &str = "crates/storefront/static/products.json";

/// Default simulated payment delay.
pub const DEFAULT_CHECKOUT_DELAY_MS: u64 = 1500;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where the product catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Fetched with an HTTP GET.
    Http(Url),
    /// Read from the local filesystem.
    File(PathBuf),
}

impl FromStr for CatalogSource {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self::Http(Url::parse(s)?))
        } else {
            Ok(Self::File(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Product feed location
    pub catalog_source: CatalogSource,
    /// Directory holding persisted carts
    pub data_dir: PathBuf,
    /// How long the simulated payment takes
    pub checkout_delay: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("ECOTREND_HOST", "127.0.0.1")?;
        let port = parse_env("ECOTREND_PORT", "3000")?;
        let base_url = get_env_or_default("ECOTREND_BASE_URL", "http://localhost:3000");
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ECOTREND_BASE_URL".to_string(), e.to_string())
        })?;
        let catalog_source = parse_env("ECOTREND_CATALOG_SOURCE", DEFAULT_CATALOG_SOURCE)?;
        let data_dir = PathBuf::from(get_env_or_default("ECOTREND_DATA_DIR", "data"));
        let delay_ms: u64 = parse_env(
            "ECOTREND_CHECKOUT_DELAY_MS",
            &DEFAULT_CHECKOUT_DELAY_MS.to_string(),
        )?;

        Ok(Self {
            host,
            port,
            base_url,
            catalog_source,
            data_dir,
            checkout_delay: Duration::from_millis(delay_ms),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            catalog_source: CatalogSource::File(PathBuf::from(DEFAULT_CATALOG_SOURCE)),
            data_dir: PathBuf::from("data"),
            checkout_delay: Duration::from_millis(DEFAULT_CHECKOUT_DELAY_MS),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            port: 8080,
            ..StorefrontConfig::default()
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_catalog_source_http() {
        let source: CatalogSource = "https://cdn.example.com/products.json".parse().unwrap();
        assert!(matches!(source, CatalogSource::Http(ref url) if url.host_str() == Some("cdn.example.com")));
    }

    #[test]
    fn test_catalog_source_file() {
        let source: CatalogSource = "static/products.json".parse().unwrap();
        assert_eq!(source, CatalogSource::File(PathBuf::from("static/products.json")));
        assert_eq!(source.to_string(), "static/products.json");
    }

    #[test]
    fn test_catalog_source_bad_url() {
        assert!("http://".parse::<CatalogSource>().is_err());
    }

    #[test]
    fn test_parse_value_invalid_port() {
        let err = parse_value::<u16>("ECOTREND_PORT", "99999").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "ECOTREND_PORT"));
    }

    #[test]
    fn test_parse_value_host() {
        let host: IpAddr = parse_value("ECOTREND_HOST", "0.0.0.0").unwrap();
        assert!(host.is_unspecified());
    }

    #[test]
    fn test_is_secure() {
        let config = StorefrontConfig {
            base_url: "https://shop.example.com".to_string(),
            ..StorefrontConfig::default()
        };
        assert!(config.is_secure());
        assert!(!StorefrontConfig::default().is_secure());
    }
}
