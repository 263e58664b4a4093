use async_trait::async_trait;

use crate::error::Result;
use crate::model::QcFlag;

/// Quality-control flags.
///
/// Each batch either succeeds as a whole and yields one id per flag, in the
/// order the flags were given, or fails as a whole.
#[async_trait]
pub trait QcFlagServiceClient: Send + Sync {
    /// Create flags for a run of a data pass.
    async fn create_for_data_pass(
        &self,
        run_number: u32,
        pass_name: &str,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>>;

    /// Create flags for a run of a simulation pass (Monte Carlo production).
    async fn create_for_simulation_pass(
        &self,
        run_number: u32,
        production_name: &str,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>>;

    /// Create synchronous flags, produced online during data taking.
    async fn create_synchronous(
        &self,
        run_number: u32,
        detector_name: &str,
        flags: &[QcFlag],
    ) -> Result<Vec<u32>>;
}
