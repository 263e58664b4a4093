//! Service client interfaces.
//!
//! One trait per remote capability of the bookkeeping server. Each trait is a
//! narrow contract over a single backend resource; the concrete transport
//! adapters live in [`crate::grpc`]. The aggregate [`crate::BkpClient`]
//! hands them out as `&dyn` trait objects.
//!
//! All operations are one request/response round trip. Nothing is retried,
//! batched or cached on the client side.

mod ctp_trigger_counters;
mod dpl_process_execution;
mod flp;
mod log;
mod qc_flag;
mod run;

pub use ctp_trigger_counters::CtpTriggerCountersServiceClient;
pub use dpl_process_execution::DplProcessExecutionServiceClient;
pub use flp::FlpServiceClient;
pub use log::LogServiceClient;
pub use qc_flag::QcFlagServiceClient;
pub use run::RunServiceClient;
