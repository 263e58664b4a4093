//! Bookkeeping endpoint configuration and URL normalization.
//!
//! - [`BkpAddress`]: validated gRPC endpoint URL with source tracking
//! - [`AddressSource`]: where the address came from
//! - [`AddressError`]: validation errors
//!
//! # Address Resolution Precedence
//!
//! Addresses are resolved in this order (highest priority first):
//! 1. Explicit argument (constructor or CLI flag)
//! 2. Configuration (`o2.bkp.grpc-uri`, see [`crate::config`])
//! 3. `BKP_GRPC_URI` environment variable
//! 4. Default: `http://127.0.0.1:4001`
//!
//! # URL Normalization
//!
//! - Bare host:port (e.g., `ali-bookkeeping:4001` → `http://ali-bookkeeping:4001`)
//! - Missing port (e.g., `http://localhost` → `http://localhost:4001`)
//! - IPv6 addresses (e.g., `[::1]:4001` → `http://[::1]:4001`)
//!
//! # Example
//!
//! ```
//! use bookkeeping_api::connection::{AddressSource, BkpAddress};
//!
//! let addr = BkpAddress::parse("ali-bookkeeping:4001", AddressSource::Explicit)?;
//! assert_eq!(addr.as_str(), "http://ali-bookkeeping:4001/");
//! assert!(!addr.is_tls());
//! # Ok::<(), bookkeeping_api::connection::AddressError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

/// Environment variable consulted when no address is configured.
pub const ENV_GRPC_URI: &str = "BKP_GRPC_URI";

/// Default gRPC port of the bookkeeping server.
pub const DEFAULT_GRPC_PORT: u16 = 4001;

/// Default address when no configuration is provided.
pub const DEFAULT_GRPC_URI: &str = "http://127.0.0.1:4001";

/// Source of the endpoint address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressSource {
    /// Hardcoded default (`http://127.0.0.1:4001`)
    Default,
    /// Loaded from the `BKP_GRPC_URI` environment variable
    Environment,
    /// Read from a configuration source
    Configuration,
    /// Passed explicitly by the caller
    Explicit,
}

impl fmt::Display for AddressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Environment => write!(f, "Environment ({ENV_GRPC_URI})"),
            Self::Configuration => write!(f, "Configuration"),
            Self::Explicit => write!(f, "Explicit"),
        }
    }
}

/// Validated bookkeeping gRPC address.
///
/// Holds a normalized URL (always with scheme and port) and where it came
/// from, for logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BkpAddress {
    url: String,
    source: AddressSource,
}

impl BkpAddress {
    /// Parse and normalize an endpoint URL.
    ///
    /// ```
    /// use bookkeeping_api::connection::{AddressSource, BkpAddress};
    ///
    /// let addr = BkpAddress::parse("localhost", AddressSource::Explicit)?;
    /// assert_eq!(addr.as_str(), "http://localhost:4001/");
    /// # Ok::<(), bookkeeping_api::connection::AddressError>(())
    /// ```
    pub fn parse(input: &str, source: AddressSource) -> Result<Self, AddressError> {
        let normalized = normalize_url(input)?;
        Ok(Self {
            url: normalized.to_string(),
            source,
        })
    }

    /// Returns the normalized URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns where this address came from.
    #[must_use]
    pub fn source(&self) -> AddressSource {
        self.source
    }

    /// Returns `true` if this address uses TLS (https scheme).
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.url.starts_with("https://")
    }
}

impl fmt::Display for BkpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl Default for BkpAddress {
    fn default() -> Self {
        Self {
            url: format!("{DEFAULT_GRPC_URI}/"),
            source: AddressSource::Default,
        }
    }
}

/// URL validation error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Input was empty or whitespace-only
    #[error("Address cannot be empty")]
    EmptyInput,
    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// No host was found in the URL
    #[error("URL must include a host")]
    MissingHost,
    /// Port could not be set
    #[error("Invalid port: {0}")]
    InvalidPort(String),
    /// Unsupported URL scheme (only http/https allowed)
    #[error("Unsupported scheme '{0}' (use http or https)")]
    UnsupportedScheme(String),
}

/// Normalize an endpoint URL string.
///
/// - Adds `http://` scheme if missing
/// - Adds default port (4001) if missing
/// - Trims whitespace
///
/// ```
/// use bookkeeping_api::connection::normalize_url;
///
/// let url = normalize_url("192.168.1.100:4001")?;
/// assert_eq!(url.as_str(), "http://192.168.1.100:4001/");
///
/// let url = normalize_url("[::1]:8080")?;
/// assert_eq!(url.as_str(), "http://[::1]:8080/");
/// # Ok::<(), bookkeeping_api::connection::AddressError>(())
/// ```
pub fn normalize_url(input: &str) -> Result<Url, AddressError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(AddressError::EmptyInput);
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| AddressError::InvalidUrl(e.to_string()))?;

    let scheme = url.scheme().to_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(AddressError::UnsupportedScheme(scheme));
    }

    if url.host().is_none() {
        return Err(AddressError::MissingHost);
    }

    if url.port().is_none() {
        url.set_port(Some(DEFAULT_GRPC_PORT))
            .map_err(|()| AddressError::InvalidPort("Cannot set port on this URL".to_string()))?;
    }

    Ok(url)
}

/// Resolve the endpoint address from the explicit argument, the configured
/// value, the environment and finally the default, in that order.
///
/// An explicit address is always parsed, so a blank or invalid one is
/// reported instead of falling through to the environment. A blank configured
/// value counts as unset; an invalid one is reported.
pub fn resolve_address(
    explicit: Option<&str>,
    configured: Option<&str>,
) -> Result<BkpAddress, AddressError> {
    if let Some(input) = explicit {
        return BkpAddress::parse(input, AddressSource::Explicit);
    }

    if let Some(input) = configured.filter(|input| !input.trim().is_empty()) {
        return BkpAddress::parse(input, AddressSource::Configuration);
    }

    if let Ok(env_url) = std::env::var(ENV_GRPC_URI) {
        if let Ok(addr) = BkpAddress::parse(&env_url, AddressSource::Environment) {
            return Ok(addr);
        }
    }

    Ok(BkpAddress::default())
}
