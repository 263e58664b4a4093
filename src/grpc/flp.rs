use async_trait::async_trait;
use bkp_proto::bookkeeping::flp_service_client::FlpServiceClient as FlpStub;
use tonic::transport::Channel;
use tracing::debug;

use super::convert::ToDomain;
use super::{requests, rpc_failure};
use crate::context::ContextFactory;
use crate::error::Result;
use crate::model::{Flp, FlpCounters};
use crate::services::FlpServiceClient;

/// [`FlpServiceClient`] over gRPC.
#[derive(Clone)]
pub struct GrpcFlpServiceClient {
    stub: FlpStub<Channel>,
    context_factory: ContextFactory,
}

impl GrpcFlpServiceClient {
    /// Client for the FLP service over `channel`.
    pub fn new(channel: Channel, context_factory: ContextFactory) -> Self {
        Self {
            stub: FlpStub::new(channel),
            context_factory,
        }
    }
}

#[async_trait]
impl FlpServiceClient for GrpcFlpServiceClient {
    async fn create(&self, name: &str, hostname: &str, run_number: Option<u32>) -> Result<Flp> {
        debug!(name, hostname, ?run_number, "Creating FLP");
        let request = (self.context_factory)()
            .into_request(requests::flp_creation(name, hostname, run_number));
        let response = self
            .stub
            .clone()
            .create(request)
            .await
            .map_err(rpc_failure("FlpService::create"))?;
        response.into_inner().to_domain()
    }

    async fn update_counters(
        &self,
        flp_name: &str,
        run_number: u32,
        counters: FlpCounters,
    ) -> Result<()> {
        debug!(flp_name, run_number, ?counters, "Updating FLP counters");
        let request = (self.context_factory)()
            .into_request(requests::flp_update_counters(flp_name, run_number, &counters));
        self.stub
            .clone()
            .update_counters(request)
            .await
            .map_err(rpc_failure("FlpService::update_counters"))?;
        Ok(())
    }
}
