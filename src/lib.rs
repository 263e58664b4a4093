//! # Bookkeeping API client
//!
//! Typed client bindings for the O2 Bookkeeping service, used by data-taking
//! processes (run control, FLPs, QC, CTP) to record runs, readout counters,
//! log entries, quality-control flags, DPL process executions and trigger
//! counters.
//!
//! ## Crate Structure
//!
//! - **`services`**: one async trait per remote capability.
//! - **`grpc`**: the gRPC binding of those traits, and the conversions
//!   between generated messages and domain records.
//! - **`model`**: owned domain records and enumerations.
//! - **`client`**: [`BkpClient`], the aggregate of all services over one
//!   channel, and [`BkpClientFactory`] to build it.
//! - **`context`**: per-call metadata (bearer token) and deadlines.
//! - **`blocking`**: a synchronous wrapper for non-async callers.
//! - **`config`** / **`connection`**: endpoint and channel configuration.
//! - **`logging`**: a ready-made `tracing` subscriber.
//!
//! ## Example
//!
//! ```no_run
//! use bookkeeping_api::model::{RunStart, RunType};
//! use bookkeeping_api::BkpClientFactory;
//! use chrono::Utc;
//!
//! # async fn demo() -> bookkeeping_api::Result<()> {
//! let client = BkpClientFactory::connect_with_token("ali-bookkeeping:4001", "token").await?;
//! let now = Utc::now();
//! let run = client
//!     .run()
//!     .start(RunStart {
//!         run_number: 9003,
//!         time_o2_start: now,
//!         time_trg_start: now,
//!         environment_id: "cpp-api".to_string(),
//!         run_type: RunType::Technical,
//!         n_detectors: 123,
//!         n_flps: 200,
//!         n_epns: 100,
//!     })
//!     .await?;
//! println!("started run {}", run.run_number);
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod grpc;
pub mod logging;
pub mod model;
pub mod services;

pub use client::{BkpClient, BkpClientFactory, ChannelConfig};
pub use config::BkpConfig;
pub use context::{CallContext, ContextFactory};
pub use error::{ClientError, Result};
pub use services::{
    CtpTriggerCountersServiceClient, DplProcessExecutionServiceClient, FlpServiceClient,
    LogServiceClient, QcFlagServiceClient, RunServiceClient,
};
