//! # Signer Module
//!
//! Wires the three hash stages into one pipeline and returns the single
//! aggregated digest.
//!
//! ## Example
//! ```rust,ignore
//! use signer_pipeline::core::signer::Signer;
//! use signer_pipeline::core::Value;
//!
//! let signer = Signer::builder().build()?;
//! let result = signer.sign(vec![Value::from(0), Value::from(1)])?;
//! println!("{}", result.digest);
//! ```

use crate::core::pipeline::{Concurrency, FanOut, Pipeline, DEFAULT_QUEUE_CAPACITY};
use crate::core::primitives::{
    Checksum, Digest, Latency, SerializedDigest, Sha256Digest, WithLatency, Xxh3Checksum,
};
use crate::core::stages::{AggregateStage, PairwiseHashStage, SextupleHashStage};
use crate::core::value::Value;
use crate::error::{PipelineError, Result};
use crate::events::{null_sender, EventSender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Result of signing a stream of values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignResult {
    /// The aggregated digest
    pub digest: String,
    /// Identifier of the pipeline run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Number of values the producer emitted, unsupported ones included
    pub values_in: usize,
    /// Number of values that made it through both hash stages
    pub values_hashed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the signer
#[derive(Debug, Clone)]
pub struct SignerConfig {
    /// Capacity of each queue between stages
    pub queue_capacity: usize,
    /// Subtask concurrency of the two hash stages
    pub concurrency: Concurrency,
    /// Delay added to every primitive call
    pub latency: Latency,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            concurrency: Concurrency::Unbounded,
            latency: Latency::none(),
        }
    }
}

/// Builder for signer configuration
pub struct SignerBuilder {
    config: SignerConfig,
    checksum: Option<Arc<dyn Checksum>>,
    digest: Option<Box<dyn Digest>>,
}

impl SignerBuilder {
    /// Create a new signer builder
    pub fn new() -> Self {
        Self {
            config: SignerConfig::default(),
            checksum: None,
            digest: None,
        }
    }

    /// Set the checksum primitive
    pub fn checksum(mut self, checksum: impl Checksum + 'static) -> Self {
        self.checksum = Some(Arc::new(checksum));
        self
    }

    /// Set the digest primitive. It is wrapped in its own serialization token.
    pub fn digest(mut self, digest: impl Digest + 'static) -> Self {
        self.digest = Some(Box::new(digest));
        self
    }

    /// Set subtask concurrency for both hash stages
    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Add a fixed delay to every primitive call
    pub fn latency(mut self, latency: Latency) -> Self {
        self.config.latency = latency;
        self
    }

    /// Build the signer
    pub fn build(self) -> Result<Signer> {
        let latency = self.config.latency;

        let mut checksum: Arc<dyn Checksum> = match self.checksum {
            Some(checksum) => checksum,
            None => Arc::new(Xxh3Checksum::new()),
        };
        if !latency.checksum.is_zero() {
            checksum = Arc::new(WithLatency::new(checksum, latency.checksum));
        }

        let digest: Box<dyn Digest> = match self.digest {
            Some(digest) => digest,
            None => Box::new(Sha256Digest::new()),
        };
        let token = if latency.digest.is_zero() {
            SerializedDigest::new(digest)
        } else {
            SerializedDigest::new(WithLatency::new(digest, latency.digest))
        };

        let pipeline = Pipeline::builder()
            .queue_capacity(self.config.queue_capacity)
            .stage(PairwiseHashStage::new(
                Arc::clone(&checksum),
                Arc::new(token),
                FanOut::new(self.config.concurrency)?,
            ))
            .stage(SextupleHashStage::new(
                checksum,
                FanOut::new(self.config.concurrency)?,
            ))
            .stage(AggregateStage::new())
            .build()?;

        Ok(Signer {
            config: self.config,
            pipeline,
        })
    }
}

impl Default for SignerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes the composite digest of a stream of values
pub struct Signer {
    config: SignerConfig,
    pipeline: Pipeline,
}

impl Signer {
    /// Create a new signer builder
    pub fn builder() -> SignerBuilder {
        SignerBuilder::new()
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    /// Names of the pipeline stages, in order
    pub fn stage_names(&self) -> Vec<String> {
        self.pipeline.stage_names()
    }

    /// Sign without events
    pub fn sign<I>(&self, values: I) -> Result<SignResult>
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send,
    {
        self.sign_with_events(values, &null_sender())
    }

    /// Sign with event reporting
    pub fn sign_with_events<I>(&self, values: I, events: &EventSender) -> Result<SignResult>
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send,
    {
        let result = self.pipeline.run_with_events(values, events)?;
        let values_hashed = result.stage_outputs.get(1).copied().unwrap_or(0);

        let count = result.outputs.len();
        let mut outputs = result.outputs.into_iter();
        let digest = match (outputs.next(), outputs.next()) {
            (Some(Value::Text(digest)), None) => digest,
            _ => return Err(PipelineError::UnexpectedOutput { count }.into()),
        };

        Ok(SignResult {
            digest,
            run_id: result.run_id,
            started_at: result.started_at,
            values_in: result.values_in,
            values_hashed,
            duration_ms: result.duration_ms,
        })
    }
}
