//! gRPC binding of the service client interfaces.
//!
//! Each `Grpc*ServiceClient` wraps a generated tonic stub together with the
//! [`ContextFactory`](crate::context::ContextFactory) of its parent client.
//! Every call:
//! - builds the request message from the caller's arguments,
//! - attaches a fresh [`CallContext`](crate::context::CallContext),
//! - performs exactly one unary round trip,
//! - converts a non-OK status into [`ClientError::Rpc`] carrying the server
//!   message unchanged.
//!
//! Stubs are cloned per call. A tonic `Channel` is a cheap handle over a
//! shared connection, so concurrent calls from several tasks are fine.

pub mod convert;
pub(crate) mod requests;

mod ctp_trigger_counters;
mod dpl_process_execution;
mod flp;
mod log;
mod qc_flag;
mod run;

pub use ctp_trigger_counters::GrpcCtpTriggerCountersServiceClient;
pub use dpl_process_execution::GrpcDplProcessExecutionServiceClient;
pub use flp::GrpcFlpServiceClient;
pub use log::GrpcLogServiceClient;
pub use qc_flag::GrpcQcFlagServiceClient;
pub use run::GrpcRunServiceClient;

use tracing::warn;

use crate::error::ClientError;

/// Map a failed call of `operation` into a [`ClientError`], logging it.
pub(crate) fn rpc_failure(operation: &'static str) -> impl FnOnce(tonic::Status) -> ClientError {
    move |status| {
        warn!(
            operation,
            code = ?status.code(),
            message = status.message(),
            "Bookkeeping request failed"
        );
        ClientError::from(status)
    }
}
