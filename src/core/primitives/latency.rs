//! Fixed-delay wrapper that models slow external primitives.

use super::traits::{Checksum, Digest};
use crate::error::PrimitiveError;
use std::thread;
use std::time::Duration;

/// Delays added to each primitive call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
    /// Added to every checksum call
    pub checksum: Duration,
    /// Added to every digest call, while the serialization lock is held
    pub digest: Duration,
}

impl Latency {
    /// No added delay
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.checksum.is_zero() && self.digest.is_zero()
    }
}

/// Wraps a primitive and sleeps before every call
#[derive(Debug, Clone)]
pub struct WithLatency<P> {
    inner: P,
    delay: Duration,
}

impl<P> WithLatency<P> {
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

impl<P: Checksum> Checksum for WithLatency<P> {
    fn checksum(&self, data: &str) -> Result<String, PrimitiveError> {
        self.pause();
        self.inner.checksum(data)
    }
}

impl<P: Digest> Digest for WithLatency<P> {
    fn digest(&mut self, data: &str) -> Result<String, PrimitiveError> {
        self.pause();
        self.inner.digest(data)
    }
}
