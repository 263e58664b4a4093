//! Client error types.
//!
//! Every operation of the façade returns [`Result`], whose error side is the
//! flat [`ClientError`] enum. There is no retryable/fatal split: a failed
//! call is reported once and the caller decides what to do with it.
//!
//! - **`Rpc`**: the server (or the transport, on its behalf) answered with a
//!   non-OK status. The `Display` output is the status message verbatim.
//! - **`Transport`**: the channel could not be built or connected.
//! - **`Address`**: the endpoint URI could not be parsed or normalized.
//! - **`InvalidEnumValue`**: an enumerated value could not be mapped. This is
//!   raised locally, before anything is sent.
//! - **`InvalidMetadata`**: a token or metadata entry is not a valid header.
//! - **`UnexpectedResponse`**: the server answered with something that does
//!   not fit the request (e.g. fewer QC flag ids than flags submitted).
//! - **`Config`** / **`InvalidConfig`**: loading or validating configuration.

use thiserror::Error;

use crate::connection::AddressError;

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the bookkeeping client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The remote call completed with a non-OK status.
    #[error("{message}")]
    Rpc {
        /// gRPC status code returned by the server.
        code: tonic::Code,
        /// Error message as provided by the transport.
        message: String,
    },

    /// gRPC transport error (connection failed, TLS error, etc.).
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Invalid endpoint address.
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    /// Enumerated value that has no counterpart on the other side.
    #[error(transparent)]
    InvalidEnumValue(#[from] ParseEnumError),

    /// Metadata key or value that cannot be sent as a gRPC header.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Response that does not match what was requested.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Configuration could not be extracted.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration was extracted but is not usable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The runtime backing the blocking client could not be started.
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

impl From<tonic::Status> for ClientError {
    fn from(status: tonic::Status) -> Self {
        Self::Rpc {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

impl ClientError {
    /// Returns the gRPC status code if this error comes from a remote call.
    #[must_use]
    pub fn code(&self) -> Option<tonic::Code> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// An enumerated value that could not be parsed or mapped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind} value: {value}")]
pub struct ParseEnumError {
    /// Name of the enumeration (e.g. `RunType`).
    pub kind: &'static str,
    /// Offending input, textual or numeric.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: impl ToString) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_displays_status_message_verbatim() {
        let status = tonic::Status::already_exists("A run already exists with run number 9003");
        let err = ClientError::from(status);

        assert_eq!(err.to_string(), "A run already exists with run number 9003");
        assert_eq!(err.code(), Some(tonic::Code::AlreadyExists));
    }

    #[test]
    fn non_rpc_errors_have_no_code() {
        let err = ClientError::UnexpectedResponse("no ids".to_string());
        assert_eq!(err.code(), None);
    }

    #[test]
    fn parse_enum_error_display() {
        let err = ClientError::from(ParseEnumError::new("RunType", "CALIBRATION"));
        assert_eq!(err.to_string(), "Invalid RunType value: CALIBRATION");
    }
}
