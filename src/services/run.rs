use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Run, RunEnd, RunStart};

/// Run lifecycle operations.
#[async_trait]
pub trait RunServiceClient: Send + Sync {
    /// Register a new run.
    ///
    /// Duplicate run numbers are rejected by the server, not checked here.
    async fn start(&self, run: RunStart) -> Result<Run>;

    /// Set the end times and quality of an existing run.
    ///
    /// Only the end fields are sent; the start data of the run is left as is.
    async fn end(&self, run_number: u32, end: RunEnd) -> Result<Run>;

    /// Attach (or replace) the raw CTP trigger configuration of a run.
    async fn set_raw_ctp_trigger_configuration(
        &self,
        run_number: u32,
        raw_ctp_trigger_configuration: &str,
    ) -> Result<()>;

    /// Fetch a run.
    async fn get(&self, run_number: u32) -> Result<Run>;
}
