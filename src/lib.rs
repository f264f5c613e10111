//! # Signer Pipeline
//!
//! Computes a deterministic composite digest of a stream of values by
//! pushing them through a chain of concurrent hashing stages.
//!
//! ## Guarantees
//! - **Deterministic** - identical input gives byte-identical output, whatever the scheduling
//! - **Serialized digest** - the digest primitive never runs twice at once
//! - **Clean shutdown** - a queue closes only after its stage drained input and joined subtasks
//!
//! ## Architecture
//! - `core` - The pipeline engine and the signing stages
//! - `events` - Event-driven progress reporting
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::{Signer, Value};
pub use error::{Result, SignerError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
