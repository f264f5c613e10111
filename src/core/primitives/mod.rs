//! # Primitives Module
//!
//! The two hashing collaborators the pipeline calls into.
//!
//! ## Contracts
//! - **Checksum** - deterministic, safe for unlimited concurrent calls
//! - **Digest** - deterministic, NOT safe for concurrent calls; only
//!   reachable from shared code through [`SerializedDigest`]
//!
//! ## Default Adapters
//! - `Xxh3Checksum` - decimal xxh3-64 of the input
//! - `Sha256Digest` - lowercase hex SHA-256 of the input
//! - `WithLatency` - wraps either primitive with a fixed delay

mod adapters;
mod latency;
mod serialized;
mod traits;

pub use adapters::{Sha256Digest, Xxh3Checksum};
pub use latency::{Latency, WithLatency};
pub use serialized::SerializedDigest;
pub use traits::{Checksum, Digest};
