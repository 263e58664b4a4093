use async_trait::async_trait;

use crate::error::Result;
use crate::model::DplProcessType;

/// DPL process executions.
#[async_trait]
pub trait DplProcessExecutionServiceClient: Send + Sync {
    /// Register the execution of a DPL process.
    async fn register_process_execution(
        &self,
        run_number: u32,
        process_type: DplProcessType,
        hostname: &str,
        process_name: &str,
        args: Option<&str>,
        detector_name: Option<&str>,
    ) -> Result<()>;
}
