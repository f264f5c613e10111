//! # Error Module
//!
//! Error types for the signer pipeline.
//!
//! ## Design Principles
//! - **Fatal means fatal** - a failing primitive aborts the whole run, no retry
//! - **Report the root cause** - downstream-closed echoes never hide the real failure
//! - **Include context** - stage names, offending values, what went wrong

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),
}

/// Errors raised while a pipeline is running
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Primitive failed: {0}")]
    Primitive(#[from] PrimitiveError),

    #[error("Stage '{stage}' could not forward a value: downstream queue is closed")]
    DownstreamClosed { stage: String },

    #[error("Expected exactly one terminal value, got {count}")]
    UnexpectedOutput { count: usize },
}

impl PipelineError {
    /// Whether this error only echoes a failure that happened further downstream
    pub fn is_downstream_closed(&self) -> bool {
        matches!(self, PipelineError::DownstreamClosed { .. })
    }
}

/// Errors reported by the checksum and digest primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("Checksum of '{input}' failed: {reason}")]
    ChecksumFailed { input: String, reason: String },

    #[error("Digest of '{input}' failed: {reason}")]
    DigestFailed { input: String, reason: String },
}

/// Errors in pipeline or signer configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid queue capacity: {value} (must be at least 1)")]
    InvalidCapacity { value: usize },

    #[error("Invalid worker count: {value} (must be at least 1)")]
    InvalidWorkers { value: usize },

    #[error("A pipeline needs at least one stage")]
    NoStages,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Errors while reading values from an external source
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read input {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read input stream: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON input must be an array of values, found {found}")]
    NotAnArray { found: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SignerError>;
