use async_trait::async_trait;

use crate::error::Result;
use crate::model::{CreateLog, Log};

/// Log entries.
#[async_trait]
pub trait LogServiceClient: Send + Sync {
    /// Create a log entry and return it as stored.
    async fn create(&self, log: CreateLog) -> Result<Log>;

    /// Fetch a log entry.
    async fn get(&self, log_id: i32) -> Result<Log>;
}
