//! Synchronous client.
//!
//! Wraps the async [`crate::BkpClient`] together with a private
//! current-thread tokio runtime. Each call blocks the calling thread until
//! its round trip completes. Use it from plain threads, never from inside an
//! async context (tokio panics when a runtime is blocked on from within
//! another).
//!
//! ```no_run
//! use bookkeeping_api::blocking::BkpClient;
//! use bookkeeping_api::model::CreateLog;
//!
//! let client = BkpClient::create_with_token("ali-bookkeeping:4001", "token")?;
//! let log = client.log().create(CreateLog::new("Beam dump", "Run ended early"))?;
//! println!("created log {}", log.id);
//! # Ok::<(), bookkeeping_api::ClientError>(())
//! ```

use tokio::runtime::{Builder, Runtime};

use crate::client::{BkpClient as AsyncClient, BkpClientFactory, ChannelConfig};
use crate::config::BkpConfig;
use crate::context::ContextFactory;
use crate::error::Result;
use crate::model::{
    CreateLog, DplProcessType, Flp, FlpCounters, Log, QcFlag, Run, RunEnd, RunStart,
    TriggerCounters,
};

/// Blocking counterpart of [`crate::BkpClient`].
pub struct BkpClient {
    // Dropped before the runtime its channel was spawned on.
    inner: AsyncClient,
    runtime: Runtime,
}

impl BkpClient {
    /// Client sending no credentials.
    pub fn create(uri: &str) -> Result<Self> {
        Self::build(|| BkpClientFactory::create(uri))
    }

    /// Client sending a bearer token on every call.
    pub fn create_with_token(uri: &str, token: &str) -> Result<Self> {
        Self::build(|| BkpClientFactory::create_with_token(uri, token))
    }

    /// Client taking the context of every call from `context_factory`.
    pub fn create_with_context_factory(uri: &str, context_factory: ContextFactory) -> Result<Self> {
        Self::build(|| BkpClientFactory::create_with_context_factory(uri, context_factory))
    }

    /// Client with custom channel configuration.
    pub fn create_with_config(
        uri: &str,
        context_factory: ContextFactory,
        config: ChannelConfig,
    ) -> Result<Self> {
        Self::build(|| BkpClientFactory::create_with_config(uri, context_factory, config))
    }

    /// Client for the endpoint, token and timeouts of `config`.
    pub fn from_config(config: &BkpConfig) -> Result<Self> {
        Self::build(|| BkpClientFactory::from_config(config))
    }

    fn build(create: impl FnOnce() -> Result<AsyncClient>) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let inner = {
            let _guard = runtime.enter();
            create()?
        };
        Ok(Self { inner, runtime })
    }

    /// Run lifecycle and CTP configuration.
    pub fn run(&self) -> RunService<'_> {
        RunService { client: self }
    }

    /// FLP registration and counters.
    pub fn flp(&self) -> FlpService<'_> {
        FlpService { client: self }
    }

    /// Log entries.
    pub fn log(&self) -> LogService<'_> {
        LogService { client: self }
    }

    /// DPL process registration.
    pub fn dpl_process_execution(&self) -> DplProcessExecutionService<'_> {
        DplProcessExecutionService { client: self }
    }

    /// QC flag batches.
    pub fn qc_flag(&self) -> QcFlagService<'_> {
        QcFlagService { client: self }
    }

    /// CTP trigger counter upserts.
    pub fn ctp_trigger_counters(&self) -> CtpTriggerCountersService<'_> {
        CtpTriggerCountersService { client: self }
    }
}

/// See [`crate::services::RunServiceClient`].
pub struct RunService<'a> {
    client: &'a BkpClient,
}

impl RunService<'_> {
    /// Blocking `start`.
    pub fn start(&self, run: RunStart) -> Result<Run> {
        let c = self.client;
        c.runtime.block_on(c.inner.run().start(run))
    }

    /// Blocking `end`.
    pub fn end(&self, run_number: u32, end: RunEnd) -> Result<Run> {
        let c = self.client;
        c.runtime.block_on(c.inner.run().end(run_number, end))
    }

    /// Blocking `set_raw_ctp_trigger_configuration`.
    pub fn set_raw_ctp_trigger_configuration(
        &self,
        run_number: u32,
        raw_ctp_trigger_configuration: &str,
    ) -> Result<()> {
        let c = self.client;
        c.runtime.block_on(
            c.inner
                .run()
                .set_raw_ctp_trigger_configuration(run_number, raw_ctp_trigger_configuration),
        )
    }

    /// Blocking `get`.
    pub fn get(&self, run_number: u32) -> Result<Run> {
        let c = self.client;
        c.runtime.block_on(c.inner.run().get(run_number))
    }
}

/// See [`crate::services::FlpServiceClient`].
pub struct FlpService<'a> {
    client: &'a BkpClient,
}

impl FlpService<'_> {
    /// Blocking `create`.
    pub fn create(&self, name: &str, hostname: &str, run_number: Option<u32>) -> Result<Flp> {
        let c = self.client;
        c.runtime.block_on(c.inner.flp().create(name, hostname, run_number))
    }

    /// Blocking `update_counters`.
    pub fn update_counters(
        &self,
        flp_name: &str,
        run_number: u32,
        counters: FlpCounters,
    ) -> Result<()> {
        let c = self.client;
        c.runtime
            .block_on(c.inner.flp().update_counters(flp_name, run_number, counters))
    }
}

/// See [`crate::services::LogServiceClient`].
pub struct LogService<'a> {
    client: &'a BkpClient,
}

impl LogService<'_> {
    /// Blocking `create`.
    pub fn create(&self, log: CreateLog) -> Result<Log> {
        let c = self.client;
        c.runtime.block_on(c.inner.log().create(log))
    }

    /// Blocking `get`.
    pub fn get(&self, log_id: i32) -> Result<Log> {
        let c = self.client;
        c.runtime.block_on(c.inner.log().get(log_id))
    }
}

/// See [`crate::services::DplProcessExecutionServiceClient`].
pub struct DplProcessExecutionService<'a> {
    client: &'a BkpClient,
}

impl DplProcessExecutionService<'_> {
    /// Blocking `register_process_execution`.
    pub fn register_process_execution(
        &self,
        run_number: u32,
        process_type: DplProcessType,
        hostname: &str,
        process_name: &str,
        args: Option<&str>,
        detector_name: Option<&str>,
    ) -> Result<()> {
        let c = self.client;
        c.runtime.block_on(c.inner.dpl_process_execution().register_process_execution(
            run_number,
            process_type,
            hostname,
            process_name,
            args,
            detector_name,
        ))
    }
}

/// See [`crate::services::QcFlagServiceClient`].
pub struct QcFlagService<'a> {
    client: &'a BkpClient,
}

impl QcFlagService<'_> {
    /// Blocking `create_for_data_pass`.
    pub fn create_for_data_pass(
        &self,
        run_number: u32,
        pass_name: &str,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>> {
        let c = self.client;
        c.runtime.block_on(c.inner.qc_flag().create_for_data_pass(
            run_number,
            pass_name,
            detector_name,
            flags,
        ))
    }

    /// Blocking `create_for_simulation_pass`.
    pub fn create_for_simulation_pass(
        &self,
        run_number: u32,
        production_name: &str,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>> {
        let c = self.client;
        c.runtime.block_on(c.inner.qc_flag().create_for_simulation_pass(
            run_number,
            production_name,
            detector_name,
            flags,
        ))
    }

    /// Blocking `create_synchronous`.
    pub fn create_synchronous(
        &self,
        run_number: u32,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>> {
        let c = self.client;
        c.runtime
            .block_on(c.inner.qc_flag().create_synchronous(run_number, detector_name, flags))
    }
}

/// See [`crate::services::CtpTriggerCountersServiceClient`].
pub struct CtpTriggerCountersService<'a> {
    client: &'a BkpClient,
}

impl CtpTriggerCountersService<'_> {
    /// Blocking `create_or_update_for_run`.
    pub fn create_or_update_for_run(
        &self,
        run_number: u32,
        class_name: &str,
        timestamp: u64,
        counters: TriggerCounters,
    ) -> Result<()> {
        let c = self.client;
        c.runtime.block_on(c.inner.ctp_trigger_counters().create_or_update_for_run(
            run_number, class_name, timestamp, counters,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn blocking_client_builds_outside_any_runtime() {
        assert!(BkpClient::create("127.0.0.1:1").is_ok());
    }

    #[test]
    fn call_to_unreachable_server_fails_with_status() {
        let client = BkpClient::create_with_config(
            "127.0.0.1:1",
            crate::context::default_context_factory(),
            ChannelConfig {
                connect_timeout: std::time::Duration::from_millis(200),
                ..ChannelConfig::default()
            },
        )
        .unwrap();

        let err = client.run().get(9003).unwrap_err();
        assert!(matches!(err, ClientError::Rpc { .. }));
    }
}
