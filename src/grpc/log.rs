use async_trait::async_trait;
use bkp_proto::bookkeeping::log_service_client::LogServiceClient as LogStub;
use tonic::transport::Channel;
use tracing::debug;

use super::convert::ToDomain;
use super::{requests, rpc_failure};
use crate::context::ContextFactory;
use crate::error::Result;
use crate::model::{CreateLog, Log};
use crate::services::LogServiceClient;

/// [`LogServiceClient`] over gRPC.
#[derive(Clone)]
pub struct GrpcLogServiceClient {
    stub: LogStub<Channel>,
    context_factory: ContextFactory,
}

impl GrpcLogServiceClient {
    /// Client for the log service over `channel`.
    pub fn new(channel: Channel, context_factory: ContextFactory) -> Self {
        Self {
            stub: LogStub::new(channel),
            context_factory,
        }
    }
}

#[async_trait]
impl LogServiceClient for GrpcLogServiceClient {
    async fn create(&self, log: CreateLog) -> Result<Log> {
        debug!(
            title = %log.title,
            run_numbers = ?log.run_numbers,
            parent_log_id = ?log.parent_log_id(),
            "Creating log"
        );
        let request = (self.context_factory)().into_request(requests::log_creation(&log));
        let response = self
            .stub
            .clone()
            .create(request)
            .await
            .map_err(rpc_failure("LogService::create"))?;
        response.into_inner().to_domain()
    }

    async fn get(&self, log_id: i32) -> Result<Log> {
        debug!(log_id, "Fetching log");
        let request = (self.context_factory)().into_request(requests::log_fetch(log_id));
        let response = self
            .stub
            .clone()
            .get(request)
            .await
            .map_err(rpc_failure("LogService::get"))?;
        response.into_inner().to_domain()
    }
}
