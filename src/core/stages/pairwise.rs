//! Pairwise hash stage.

use crate::core::pipeline::{FanOut, Stage, StageContext};
use crate::core::primitives::{Checksum, SerializedDigest};
use crate::error::PipelineError;
use std::sync::Arc;

/// Joins the two halves of a pairwise hash
pub const SEPARATOR: char = '~';

/// For each value `v`, emits `checksum(v) ~ checksum(digest(v))`.
///
/// The two halves are computed concurrently. The digest call goes through
/// the shared [`SerializedDigest`], so it never overlaps another digest,
/// while checksums run freely alongside it.
pub struct PairwiseHashStage {
    checksum: Arc<dyn Checksum>,
    digest: Arc<SerializedDigest>,
    fan_out: FanOut,
}

impl PairwiseHashStage {
    pub fn new(
        checksum: Arc<dyn Checksum>,
        digest: Arc<SerializedDigest>,
        fan_out: FanOut,
    ) -> Self {
        Self {
            checksum,
            digest,
            fan_out,
        }
    }

    /// Compute the pairwise hash of a single value
    pub fn combine(&self, value: &str) -> Result<String, PipelineError> {
        let (plain, digested) = self.fan_out.join(
            || self.checksum.checksum(value),
            || {
                let digest = self.digest.digest(value)?;
                self.checksum.checksum(&digest)
            },
        );
        Ok(format!("{}{}{}", plain?, SEPARATOR, digested?))
    }
}

impl Stage for PairwiseHashStage {
    fn name(&self) -> &str {
        "pairwise_hash"
    }

    fn run(&self, ctx: &StageContext) -> Result<(), PipelineError> {
        self.fan_out.run(ctx, |value| self.combine(&value))
    }
}
