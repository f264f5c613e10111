//! Sextuple hash stage.

use crate::core::pipeline::{FanOut, Stage, StageContext};
use crate::core::primitives::Checksum;
use crate::error::PipelineError;
use std::sync::Arc;

/// Number of indexed variants per value
pub const VARIANTS: usize = 6;

/// For each value `v`, emits `checksum("0"+v) + ... + checksum("5"+v)`.
///
/// The six checksums run concurrently; results are joined back in index
/// order no matter which finishes first.
pub struct SextupleHashStage {
    checksum: Arc<dyn Checksum>,
    fan_out: FanOut,
}

impl SextupleHashStage {
    pub fn new(checksum: Arc<dyn Checksum>, fan_out: FanOut) -> Self {
        Self { checksum, fan_out }
    }

    /// Compute the six-variant hash of a single value
    pub fn expand(&self, value: &str) -> Result<String, PipelineError> {
        let variants = self
            .fan_out
            .map_indexed(VARIANTS, |index| {
                self.checksum.checksum(&format!("{}{}", index, value))
            })
            .into_iter()
            .collect::<Result<Vec<String>, _>>()?;
        Ok(variants.concat())
    }
}

impl Stage for SextupleHashStage {
    fn name(&self) -> &str {
        "sextuple_hash"
    }

    fn run(&self, ctx: &StageContext) -> Result<(), PipelineError> {
        self.fan_out.run(ctx, |value| self.expand(&value))
    }
}
