//! # Stages Module
//!
//! The three stages of the signer pipeline.
//!
//! 1. **Pairwise** - `checksum(v) ~ checksum(digest(v))`, both halves concurrently
//! 2. **Sextuple** - six indexed checksums, concatenated in index order
//! 3. **Aggregate** - sort everything, join with `_`, emit one value
//!
//! Ordering is re-imposed twice: by index in the sextuple stage and by
//! sort in the aggregator. Nothing else in the pipeline is ordered.

mod aggregate;
mod pairwise;
mod sextuple;

pub use aggregate::{aggregate_values, AggregateStage, JOINER};
pub use pairwise::{PairwiseHashStage, SEPARATOR};
pub use sextuple::{SextupleHashStage, VARIANTS};
