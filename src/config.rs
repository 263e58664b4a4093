//! Client configuration using Figment.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. Environment variables prefixed with `BKP_`, nested with `__`
//!
//! ```toml
//! log_level = "info"
//!
//! [o2.bkp]
//! grpc-uri = "ali-bookkeeping.cern.ch:4001"
//! token = "…"
//!
//! [channel]
//! connect_timeout_ms = 10000
//! request_timeout_ms = 30000
//! keepalive_interval_ms = 10000
//! ```
//!
//! The same endpoint from the environment: `BKP_O2__BKP__GRPC_URI=...`.
//! Older deployments set `o2.bookkeeping.grpc-url`; it is still read when
//! `o2.bkp.grpc-uri` is absent.

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::client::ChannelConfig;
use crate::connection::normalize_url;
use crate::error::{ClientError, Result};

/// Prefix of the environment variables read by [`BkpConfig::load`].
pub const ENV_PREFIX: &str = "BKP_";

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bkp.toml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BkpConfig {
    /// Endpoint and credentials, under the `o2.` namespace.
    #[serde(default)]
    pub o2: O2Config,
    /// Channel timeouts.
    #[serde(default)]
    pub channel: ChannelSettings,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// The `o2.` namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct O2Config {
    /// `o2.bkp.*`
    #[serde(default)]
    pub bkp: BkpSection,
    /// `o2.bookkeeping.*`, the legacy location of the endpoint.
    #[serde(default)]
    pub bookkeeping: LegacyBookkeepingSection,
}

/// The `o2.bkp.` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BkpSection {
    /// `o2.bkp.grpc-uri`
    #[serde(
        rename = "grpc-uri",
        alias = "grpc_uri",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub grpc_uri: Option<String>,
    /// `o2.bkp.token`, sent as a bearer token on every call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// The `o2.bookkeeping.` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyBookkeepingSection {
    /// `o2.bookkeeping.grpc-url`
    #[serde(
        rename = "grpc-url",
        alias = "grpc_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub grpc_url: Option<String>,
}

/// Channel timeouts, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Time allowed to establish the connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Applied to every call that does not set its own deadline.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// HTTP/2 keepalive ping interval.
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_ms: u64,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_keepalive_interval() -> u64 {
    10_000
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            keepalive_interval_ms: default_keepalive_interval(),
        }
    }
}

impl Default for BkpConfig {
    fn default() -> Self {
        Self {
            o2: O2Config::default(),
            channel: ChannelSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl BkpConfig {
    /// Load from `bkp.toml` in the working directory (if present) and the
    /// environment.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific TOML file and the environment.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_figment(Self::figment(Some(path.as_ref())))
    }

    /// The provider stack used by [`load_from`](Self::load_from), for callers
    /// that want to merge their own sources on top.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .split("__")
                // Env keys are snake case; the endpoint keys are kebab case.
                .map(|key| {
                    key.as_str()
                        .to_ascii_lowercase()
                        .replace("grpc_uri", "grpc-uri")
                        .replace("grpc_url", "grpc-url")
                        .into()
                }),
        )
    }

    /// Extract from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    /// Configured endpoint, preferring `o2.bkp.grpc-uri` over the legacy key.
    #[must_use]
    pub fn grpc_uri(&self) -> Option<&str> {
        non_blank(self.o2.bkp.grpc_uri.as_deref())
            .or_else(|| non_blank(self.o2.bookkeeping.grpc_url.as_deref()))
    }

    /// Configured endpoint, failing when neither key is set.
    pub fn require_grpc_uri(&self) -> Result<&str> {
        self.grpc_uri().ok_or_else(|| {
            ClientError::InvalidConfig(
                "missing endpoint: set o2.bkp.grpc-uri (or o2.bookkeeping.grpc-url)".to_string(),
            )
        })
    }

    /// Configured bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        non_blank(self.o2.bkp.token.as_deref())
    }

    /// Channel settings as durations.
    #[must_use]
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            connect_timeout: Duration::from_millis(self.channel.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.channel.request_timeout_ms),
            keepalive_interval: Duration::from_millis(self.channel.keepalive_interval_ms),
            ..ChannelConfig::default()
        }
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ClientError::InvalidConfig(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if let Some(uri) = self.grpc_uri() {
            normalize_url(uri)
                .map_err(|e| ClientError::InvalidConfig(format!("Invalid grpc-uri '{uri}': {e}")))?;
        }

        let timeouts = [
            ("connect_timeout_ms", self.channel.connect_timeout_ms),
            ("request_timeout_ms", self.channel.request_timeout_ms),
            ("keepalive_interval_ms", self.channel.keepalive_interval_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ClientError::InvalidConfig(format!(
                    "Invalid channel.{name}: must be greater than 0"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_but_have_no_endpoint() {
        let config = BkpConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grpc_uri(), None);
        assert!(matches!(
            config.require_grpc_uri().unwrap_err(),
            ClientError::InvalidConfig(_)
        ));
    }

    #[test]
    fn legacy_key_is_used_as_fallback() {
        let mut config = BkpConfig::default();
        config.o2.bookkeeping.grpc_url = Some("legacy:4001".to_string());
        assert_eq!(config.grpc_uri(), Some("legacy:4001"));

        config.o2.bkp.grpc_uri = Some("current:4001".to_string());
        assert_eq!(config.grpc_uri(), Some("current:4001"));
    }

    #[test]
    fn blank_primary_key_does_not_hide_legacy_key() {
        let mut config = BkpConfig::default();
        config.o2.bkp.grpc_uri = Some("  ".to_string());
        config.o2.bookkeeping.grpc_url = Some("legacy:4001".to_string());
        assert_eq!(config.grpc_uri(), Some("legacy:4001"));
        assert_eq!(config.require_grpc_uri().unwrap(), "legacy:4001");
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let config = BkpConfig {
            log_level: "verbose".to_string(),
            ..BkpConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_uri_is_rejected() {
        let mut config = BkpConfig::default();
        config.o2.bkp.grpc_uri = Some("ftp://bkp".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("grpc-uri"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = BkpConfig::default();
        config.channel.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn channel_config_uses_milliseconds() {
        let mut config = BkpConfig::default();
        config.channel.connect_timeout_ms = 1500;
        let channel = config.channel_config();
        assert_eq!(channel.connect_timeout, Duration::from_millis(1500));
        assert_eq!(channel.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn toml_keys_are_kebab_case() {
        let config = BkpConfig::from_figment(Figment::from(Toml::string(
            r#"
            [o2.bkp]
            grpc-uri = "bkp.local:4001"
            token = "secret"
            "#,
        )))
        .unwrap();
        assert_eq!(config.grpc_uri(), Some("bkp.local:4001"));
        assert_eq!(config.token(), Some("secret"));
        assert_eq!(config.log_level, "info");
    }
}
