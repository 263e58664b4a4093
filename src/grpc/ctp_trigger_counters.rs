use async_trait::async_trait;
use bkp_proto::bookkeeping::ctp_trigger_counters_service_client as ctp;
use tonic::transport::Channel;
use tracing::debug;

use super::{requests, rpc_failure};
use crate::context::ContextFactory;
use crate::error::Result;
use crate::model::TriggerCounters;
use crate::services::CtpTriggerCountersServiceClient;

/// [`CtpTriggerCountersServiceClient`] over gRPC.
#[derive(Clone)]
pub struct GrpcCtpTriggerCountersServiceClient {
    stub: ctp::CtpTriggerCountersServiceClient<Channel>,
    context_factory: ContextFactory,
}

impl GrpcCtpTriggerCountersServiceClient {
    /// Client for the CTP trigger counters service over `channel`.
    pub fn new(channel: Channel, context_factory: ContextFactory) -> Self {
        Self {
            stub: ctp::CtpTriggerCountersServiceClient::new(channel),
            context_factory,
        }
    }
}

#[async_trait]
impl CtpTriggerCountersServiceClient for GrpcCtpTriggerCountersServiceClient {
    async fn create_or_update_for_run(
        &self,
        run_number: u32,
        class_name: &str,
        timestamp: u64,
        counters: TriggerCounters,
    ) -> Result<()> {
        debug!(run_number, class_name, timestamp, "Storing CTP trigger counters");
        let request = (self.context_factory)().into_request(requests::ctp_trigger_counters(
            run_number, class_name, timestamp, &counters,
        ));
        self.stub
            .clone()
            .create_or_update_for_run(request)
            .await
            .map_err(rpc_failure("CtpTriggerCountersService::create_or_update_for_run"))?;
        Ok(())
    }
}
