use async_trait::async_trait;
use bkp_proto::bookkeeping::qc_flag_service_client::QcFlagServiceClient as QcFlagStub;
use bkp_proto::bookkeeping::QcFlagCreationResponse;
use tonic::transport::Channel;
use tracing::debug;

use super::{requests, rpc_failure};
use crate::context::ContextFactory;
use crate::error::{ClientError, Result};
use crate::model::QcFlag;
use crate::services::QcFlagServiceClient;

/// [`QcFlagServiceClient`] over gRPC.
#[derive(Clone)]
pub struct GrpcQcFlagServiceClient {
    stub: QcFlagStub<Channel>,
    context_factory: ContextFactory,
}

impl GrpcQcFlagServiceClient {
    /// Client for the QC flag service over `channel`.
    pub fn new(channel: Channel, context_factory: ContextFactory) -> Self {
        Self {
            stub: QcFlagStub::new(channel),
            context_factory,
        }
    }
}

/// The server answers with one id per submitted flag, in submission order.
fn flag_ids(response: QcFlagCreationResponse, submitted: usize) -> Result<Vec<u32>> {
    if response.flag_ids.len() != submitted {
        return Err(ClientError::UnexpectedResponse(format!(
            "{} QC flag ids returned for {submitted} flags",
            response.flag_ids.len()
        )));
    }
    Ok(response.flag_ids)
}

#[async_trait]
impl QcFlagServiceClient for GrpcQcFlagServiceClient {
    async fn create_for_data_pass(
        &self,
        run_number: u32,
        pass_name: &str,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>> {
        debug!(
            run_number,
            pass_name,
            detector_name,
            count = flags.len(),
            "Creating data pass QC flags"
        );
        let request = (self.context_factory)().into_request(requests::data_pass_qc_flags(
            run_number,
            pass_name,
            detector_name,
            flags,
        ));
        let response = self
            .stub
            .clone()
            .create_for_data_pass(request)
            .await
            .map_err(rpc_failure("QcFlagService::create_for_data_pass"))?;
        flag_ids(response.into_inner(), flags.len())
    }

    async fn create_for_simulation_pass(
        &self,
        run_number: u32,
        production_name: &str,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>> {
        debug!(
            run_number,
            production_name,
            detector_name,
            count = flags.len(),
            "Creating simulation pass QC flags"
        );
        let request = (self.context_factory)().into_request(requests::simulation_pass_qc_flags(
            run_number,
            production_name,
            detector_name,
            flags,
        ));
        let response = self
            .stub
            .clone()
            .create_for_simulation_pass(request)
            .await
            .map_err(rpc_failure("QcFlagService::create_for_simulation_pass"))?;
        flag_ids(response.into_inner(), flags.len())
    }

    async fn create_synchronous(
        &self,
        run_number: u32,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>> {
        debug!(run_number, detector_name, count = flags.len(), "Creating synchronous QC flags");
        let request = (self.context_factory)()
            .into_request(requests::synchronous_qc_flags(run_number, detector_name, flags));
        let response = self
            .stub
            .clone()
            .create_synchronous(request)
            .await
            .map_err(rpc_failure("QcFlagService::create_synchronous"))?;
        flag_ids(response.into_inner(), flags.len())
    }
}
