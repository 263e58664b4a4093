use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Flp, FlpCounters};

/// FLP registration and readout counters.
#[async_trait]
pub trait FlpServiceClient: Send + Sync {
    /// Register an FLP, optionally bound to a run.
    async fn create(&self, name: &str, hostname: &str, run_number: Option<u32>) -> Result<Flp>;

    /// Overwrite the readout counters of the FLP `flp_name` in `run_number`.
    ///
    /// Counters are absolute: calling this twice stores the second snapshot,
    /// it does not add the two.
    async fn update_counters(
        &self,
        flp_name: &str,
        run_number: u32,
        counters: FlpCounters,
    ) -> Result<()>;
}
