use async_trait::async_trait;
use bkp_proto::bookkeeping::run_service_client::RunServiceClient as RunStub;
use tonic::transport::Channel;
use tracing::debug;

use super::convert::ToDomain;
use super::{requests, rpc_failure};
use crate::context::ContextFactory;
use crate::error::Result;
use crate::model::{Run, RunEnd, RunStart};
use crate::services::RunServiceClient;

/// [`RunServiceClient`] over gRPC.
#[derive(Clone)]
pub struct GrpcRunServiceClient {
    stub: RunStub<Channel>,
    context_factory: ContextFactory,
}

impl GrpcRunServiceClient {
    /// Client for the run service over `channel`.
    pub fn new(channel: Channel, context_factory: ContextFactory) -> Self {
        Self {
            stub: RunStub::new(channel),
            context_factory,
        }
    }
}

#[async_trait]
impl RunServiceClient for GrpcRunServiceClient {
    async fn start(&self, run: RunStart) -> Result<Run> {
        debug!(
            run_number = run.run_number,
            run_type = %run.run_type,
            environment_id = %run.environment_id,
            "Starting run"
        );
        let request = (self.context_factory)().into_request(requests::run_start(&run));
        let response = self
            .stub
            .clone()
            .start(request)
            .await
            .map_err(rpc_failure("RunService::start"))?;
        response.into_inner().to_domain()
    }

    async fn end(&self, run_number: u32, end: RunEnd) -> Result<Run> {
        debug!(run_number, run_quality = %end.run_quality, "Ending run");
        let request = (self.context_factory)().into_request(requests::run_end(run_number, &end));
        let response = self
            .stub
            .clone()
            .update(request)
            .await
            .map_err(rpc_failure("RunService::end"))?;
        response.into_inner().to_domain()
    }

    async fn set_raw_ctp_trigger_configuration(
        &self,
        run_number: u32,
        raw_ctp_trigger_configuration: &str,
    ) -> Result<()> {
        debug!(
            run_number,
            length = raw_ctp_trigger_configuration.len(),
            "Setting raw CTP trigger configuration"
        );
        let request = (self.context_factory)().into_request(
            requests::set_raw_ctp_trigger_configuration(run_number, raw_ctp_trigger_configuration),
        );
        self.stub
            .clone()
            .set_raw_ctp_trigger_configuration(request)
            .await
            .map_err(rpc_failure("RunService::set_raw_ctp_trigger_configuration"))?;
        Ok(())
    }

    async fn get(&self, run_number: u32) -> Result<Run> {
        debug!(run_number, "Fetching run");
        let request = (self.context_factory)().into_request(requests::run_fetch(run_number));
        let response = self
            .stub
            .clone()
            .get(request)
            .await
            .map_err(rpc_failure("RunService::get"))?;
        response.into_inner().to_domain()
    }
}
