//! Per-call request context.
//!
//! Every RPC is sent with a fresh [`CallContext`] produced by the client's
//! [`ContextFactory`]. The context carries the metadata attached to the call
//! (typically `authorization: Bearer <token>`) and an optional deadline.
//!
//! Injecting the factory at construction time, rather than baking a token
//! into the channel, lets callers rotate credentials between calls without
//! rebuilding the connection:
//!
//! ```
//! use std::sync::{Arc, RwLock};
//! use bookkeeping_api::context::{CallContext, ContextFactory};
//!
//! let token = Arc::new(RwLock::new(String::from("first-token")));
//! let shared = Arc::clone(&token);
//! let factory: ContextFactory = Arc::new(move || {
//!     let token = shared.read().map(|t| t.clone()).unwrap_or_default();
//!     CallContext::with_bearer_token(&token).unwrap_or_default()
//! });
//!
//! assert_eq!(factory().authorization(), Some("Bearer first-token"));
//! *token.write().unwrap() = String::from("second-token");
//! assert_eq!(factory().authorization(), Some("Bearer second-token"));
//! ```

use std::sync::Arc;
use std::time::Duration;

use tonic::metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue};
use tonic::Request;

use crate::error::{ClientError, Result};

/// Metadata key carrying the credential.
pub const AUTHORIZATION_KEY: &str = "authorization";

/// Produces the context of a single call.
pub type ContextFactory = Arc<dyn Fn() -> CallContext + Send + Sync>;

/// Metadata and deadline applied to one outgoing request.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    metadata: MetadataMap,
    timeout: Option<Duration>,
}

impl CallContext {
    /// An empty context: no metadata, channel-level timeout only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context authenticating the call with `authorization: Bearer <token>`.
    pub fn with_bearer_token(token: &str) -> Result<Self> {
        Ok(Self::new().with_authorization(bearer_value(token)?))
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: &str, value: &str) -> Result<Self> {
        let key = MetadataKey::<Ascii>::from_bytes(key.as_bytes())
            .map_err(|e| ClientError::InvalidMetadata(format!("key '{key}': {e}")))?;
        let value = value
            .parse::<MetadataValue<Ascii>>()
            .map_err(|e| {
                ClientError::InvalidMetadata(format!("value for '{}': {e}", key.as_str()))
            })?;
        self.metadata.insert(key, value);
        Ok(self)
    }

    /// Bound the call duration. Sent to the server as `grpc-timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Value of the `authorization` entry, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.metadata
            .get(AUTHORIZATION_KEY)
            .and_then(|value| value.to_str().ok())
    }

    /// Metadata sent with the call.
    #[must_use]
    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    /// Deadline of the call, if set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn with_authorization(mut self, value: MetadataValue<Ascii>) -> Self {
        self.metadata.insert(AUTHORIZATION_KEY, value);
        self
    }

    /// Wrap `message` into a request carrying this context.
    pub(crate) fn into_request<T>(self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        *request.metadata_mut() = self.metadata;
        // Must come after the metadata swap: the deadline is itself metadata.
        if let Some(timeout) = self.timeout {
            request.set_timeout(timeout);
        }
        request
    }
}

/// Factory producing empty contexts.
#[must_use]
pub fn default_context_factory() -> ContextFactory {
    Arc::new(CallContext::new)
}

/// Factory authenticating every call with the same bearer token.
///
/// The token is validated once, here, so that a malformed token fails at
/// construction instead of on the first call.
pub fn bearer_token_context_factory(token: &str) -> Result<ContextFactory> {
    let value = bearer_value(token)?;
    Ok(Arc::new(move || CallContext::new().with_authorization(value.clone())))
}

fn bearer_value(token: &str) -> Result<MetadataValue<Ascii>> {
    format!("Bearer {}", token.trim())
        .parse::<MetadataValue<Ascii>>()
        .map_err(|e| ClientError::InvalidMetadata(format!("bearer token: {e}")))
}
