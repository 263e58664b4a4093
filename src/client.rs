//! Aggregate client and its factory.
//!
//! [`BkpClient`] bundles one client per bookkeeping service over a single
//! shared channel. It is only built through [`BkpClientFactory`].

use std::time::Duration;

use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info};

use crate::config::BkpConfig;
use crate::connection::{resolve_address, BkpAddress};
use crate::context::{bearer_token_context_factory, default_context_factory, ContextFactory};
use crate::error::Result;
use crate::grpc::{
    GrpcCtpTriggerCountersServiceClient, GrpcDplProcessExecutionServiceClient,
    GrpcFlpServiceClient, GrpcLogServiceClient, GrpcQcFlagServiceClient, GrpcRunServiceClient,
};
use crate::services::{
    CtpTriggerCountersServiceClient, DplProcessExecutionServiceClient, FlpServiceClient,
    LogServiceClient, QcFlagServiceClient, RunServiceClient,
};

/// Channel configuration for the bookkeeping connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// How long to wait for the connection to be established
    pub connect_timeout: Duration,
    /// Deadline of calls whose context does not set one
    pub request_timeout: Duration,
    /// HTTP/2 keepalive interval (how often to send keepalive pings)
    pub keepalive_interval: Duration,
    /// Keepalive timeout (how long to wait for keepalive response)
    pub keepalive_timeout: Duration,
    /// Whether to send keepalive pings even when idle
    pub keepalive_while_idle: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(10),
            keepalive_timeout: Duration::from_secs(20),
            keepalive_while_idle: true,
        }
    }
}

impl ChannelConfig {
    /// Endpoint for `address` with these settings. TLS is enabled for
    /// `https://` addresses, using the platform root certificates.
    pub fn endpoint(&self, address: &BkpAddress) -> Result<Endpoint> {
        let mut endpoint = Endpoint::from_shared(address.as_str().to_string())?
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .http2_keep_alive_interval(self.keepalive_interval)
            .keep_alive_timeout(self.keepalive_timeout)
            .keep_alive_while_idle(self.keepalive_while_idle);

        if address.is_tls() {
            endpoint = endpoint.tls_config(ClientTlsConfig::new())?;
        }

        Ok(endpoint)
    }
}

/// Entry point to every bookkeeping service.
///
/// Cloning is cheap: clones share the underlying connection. Instances come
/// from [`BkpClientFactory`]; wrapping an arbitrary channel is not public.
///
/// ```compile_fail
/// let _ = bookkeeping_api::BkpClient::from_channel;
/// ```
#[derive(Clone)]
pub struct BkpClient {
    run: GrpcRunServiceClient,
    flp: GrpcFlpServiceClient,
    log: GrpcLogServiceClient,
    dpl_process_execution: GrpcDplProcessExecutionServiceClient,
    qc_flag: GrpcQcFlagServiceClient,
    ctp_trigger_counters: GrpcCtpTriggerCountersServiceClient,
}

impl BkpClient {
    /// Build every service client over `channel`, each call taking its
    /// context from `context_factory`.
    pub(crate) fn from_channel(channel: Channel, context_factory: ContextFactory) -> Self {
        Self {
            run: GrpcRunServiceClient::new(channel.clone(), context_factory.clone()),
            flp: GrpcFlpServiceClient::new(channel.clone(), context_factory.clone()),
            log: GrpcLogServiceClient::new(channel.clone(), context_factory.clone()),
            dpl_process_execution: GrpcDplProcessExecutionServiceClient::new(
                channel.clone(),
                context_factory.clone(),
            ),
            qc_flag: GrpcQcFlagServiceClient::new(channel.clone(), context_factory.clone()),
            ctp_trigger_counters: GrpcCtpTriggerCountersServiceClient::new(
                channel,
                context_factory,
            ),
        }
    }

    /// Run lifecycle and CTP configuration.
    #[must_use]
    pub fn run(&self) -> &dyn RunServiceClient {
        &self.run
    }

    /// FLP registration and counters.
    #[must_use]
    pub fn flp(&self) -> &dyn FlpServiceClient {
        &self.flp
    }

    /// Log entries.
    #[must_use]
    pub fn log(&self) -> &dyn LogServiceClient {
        &self.log
    }

    /// DPL process registration.
    #[must_use]
    pub fn dpl_process_execution(&self) -> &dyn DplProcessExecutionServiceClient {
        &self.dpl_process_execution
    }

    /// QC flag batches.
    #[must_use]
    pub fn qc_flag(&self) -> &dyn QcFlagServiceClient {
        &self.qc_flag
    }

    /// CTP trigger counter upserts.
    #[must_use]
    pub fn ctp_trigger_counters(&self) -> &dyn CtpTriggerCountersServiceClient {
        &self.ctp_trigger_counters
    }
}

/// Builds [`BkpClient`]s.
///
/// The `create*` functions return immediately with a lazily connecting
/// channel; the connection is made on the first call, and a failure to
/// connect is reported by that call. They must be called from within a tokio
/// runtime. The `connect*` functions dial eagerly and fail fast when the
/// server is unreachable.
///
/// ```no_run
/// use bookkeeping_api::BkpClientFactory;
///
/// # async fn demo() -> bookkeeping_api::Result<()> {
/// let client = BkpClientFactory::create_with_token("ali-bookkeeping:4001", "token")?;
/// let run = client.run().get(9003).await?;
/// println!("{:?}", run.run_type);
/// # Ok(())
/// # }
/// ```
pub struct BkpClientFactory;

impl BkpClientFactory {
    /// Client sending no credentials.
    pub fn create(uri: &str) -> Result<BkpClient> {
        Self::create_with_context_factory(uri, default_context_factory())
    }

    /// Client sending `authorization: Bearer <token>` on every call.
    pub fn create_with_token(uri: &str, token: &str) -> Result<BkpClient> {
        Self::create_with_context_factory(uri, bearer_token_context_factory(token)?)
    }

    /// Client taking the context of every call from `context_factory`.
    pub fn create_with_context_factory(
        uri: &str,
        context_factory: ContextFactory,
    ) -> Result<BkpClient> {
        Self::create_with_config(uri, context_factory, ChannelConfig::default())
    }

    /// Fully specified lazy client.
    pub fn create_with_config(
        uri: &str,
        context_factory: ContextFactory,
        config: ChannelConfig,
    ) -> Result<BkpClient> {
        let address = resolve_address(Some(uri), None)?;
        Self::create_for_address(&address, context_factory, config)
    }

    fn create_for_address(
        address: &BkpAddress,
        context_factory: ContextFactory,
        config: ChannelConfig,
    ) -> Result<BkpClient> {
        let channel = config.endpoint(address)?.connect_lazy();
        debug!(%address, source = %address.source(), "Created lazy bookkeeping channel");
        Ok(BkpClient::from_channel(channel, context_factory))
    }

    /// Lazy client for the endpoint, token and timeouts of `config`.
    pub fn from_config(config: &BkpConfig) -> Result<BkpClient> {
        config.validate()?;
        let uri = config.require_grpc_uri()?;
        let context_factory = match config.token() {
            Some(token) => bearer_token_context_factory(token)?,
            None => default_context_factory(),
        };
        let address = resolve_address(None, Some(uri))?;
        Self::create_for_address(&address, context_factory, config.channel_config())
    }

    /// Connect without credentials.
    pub async fn connect(uri: &str) -> Result<BkpClient> {
        Self::connect_with_context_factory(uri, default_context_factory()).await
    }

    /// Connect, sending a bearer token on every call.
    pub async fn connect_with_token(uri: &str, token: &str) -> Result<BkpClient> {
        Self::connect_with_context_factory(uri, bearer_token_context_factory(token)?).await
    }

    /// Connect, taking the context of every call from `context_factory`.
    pub async fn connect_with_context_factory(
        uri: &str,
        context_factory: ContextFactory,
    ) -> Result<BkpClient> {
        Self::connect_with_config(uri, context_factory, ChannelConfig::default()).await
    }

    /// Connect with custom channel configuration.
    pub async fn connect_with_config(
        uri: &str,
        context_factory: ContextFactory,
        config: ChannelConfig,
    ) -> Result<BkpClient> {
        let address = resolve_address(Some(uri), None)?;
        let channel = config.endpoint(&address)?.connect().await?;
        info!(%address, "Connected to bookkeeping");
        Ok(BkpClient::from_channel(channel, context_factory))
    }
}
