//! # Core Module
//!
//! The signing engine.
//!
//! ## Modules
//! - `value` - The tagged value type flowing through queues
//! - `input` - Reads producer input from JSON or text lines
//! - `primitives` - Checksum and digest traits, adapters, the serialization token
//! - `pipeline` - Queues, stage lifecycle, fan-out runner, executor
//! - `stages` - Pairwise, sextuple and aggregate stages
//! - `signer` - Wires the stages into the signing pipeline

pub mod input;
pub mod pipeline;
pub mod primitives;
pub mod signer;
pub mod stages;
pub mod value;

// Re-export commonly used types
pub use pipeline::{Concurrency, Pipeline, Stage, StageContext, StageState};
pub use primitives::{Checksum, Digest, Latency};
pub use signer::{SignResult, Signer, SignerBuilder};
pub use value::Value;
