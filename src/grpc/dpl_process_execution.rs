use async_trait::async_trait;
use bkp_proto::bookkeeping::dpl_process_execution_service_client as dpl;
use tonic::transport::Channel;
use tracing::debug;

use super::convert::ToDomain;
use super::{requests, rpc_failure};
use crate::context::ContextFactory;
use crate::error::Result;
use crate::model::{DplProcessExecution, DplProcessType};
use crate::services::DplProcessExecutionServiceClient;

/// [`DplProcessExecutionServiceClient`] over gRPC.
#[derive(Clone)]
pub struct GrpcDplProcessExecutionServiceClient {
    stub: dpl::DplProcessExecutionServiceClient<Channel>,
    context_factory: ContextFactory,
}

impl GrpcDplProcessExecutionServiceClient {
    /// Client for the DPL process execution service over `channel`.
    pub fn new(channel: Channel, context_factory: ContextFactory) -> Self {
        Self {
            stub: dpl::DplProcessExecutionServiceClient::new(channel),
            context_factory,
        }
    }
}

#[async_trait]
impl DplProcessExecutionServiceClient for GrpcDplProcessExecutionServiceClient {
    async fn register_process_execution(
        &self,
        run_number: u32,
        process_type: DplProcessType,
        hostname: &str,
        process_name: &str,
        args: Option<&str>,
        detector_name: Option<&str>,
    ) -> Result<()> {
        debug!(
            run_number,
            %process_type,
            hostname,
            process_name,
            ?detector_name,
            "Registering DPL process execution"
        );
        let request = (self.context_factory)().into_request(requests::dpl_process_execution(
            run_number,
            process_type,
            hostname,
            process_name,
            args,
            detector_name,
        ));
        let response = self
            .stub
            .clone()
            .register_process_execution(request)
            .await
            .map_err(rpc_failure("DplProcessExecutionService::register_process_execution"))?;
        let execution: DplProcessExecution = response.into_inner().to_domain()?;
        debug!(id = execution.id, "Registered DPL process execution");
        Ok(())
    }
}
