use async_trait::async_trait;

use crate::error::Result;
use crate::model::TriggerCounters;

/// CTP trigger counters.
#[async_trait]
pub trait CtpTriggerCountersServiceClient: Send + Sync {
    /// Create the counters of `class_name` in `run_number`, or replace them
    /// if they already exist.
    async fn create_or_update_for_run(
        &self,
        run_number: u32,
        class_name: &str,
        timestamp: u64,
        counters: TriggerCounters,
    ) -> Result<()>;
}
