//! Trait definitions for the hashing primitives.

use crate::error::PrimitiveError;
use std::sync::Arc;

/// A checksum that any number of threads may call at once
pub trait Checksum: Send + Sync {
    /// Compute the checksum of `data` as text
    fn checksum(&self, data: &str) -> Result<String, PrimitiveError>;
}

/// A digest that must never run concurrently with itself.
///
/// Taking `&mut self` makes exclusive access part of the signature; shared
/// callers go through [`super::SerializedDigest`].
pub trait Digest: Send {
    /// Compute the digest of `data` as text
    fn digest(&mut self, data: &str) -> Result<String, PrimitiveError>;
}

impl<T: Checksum + ?Sized> Checksum for Arc<T> {
    fn checksum(&self, data: &str) -> Result<String, PrimitiveError> {
        (**self).checksum(data)
    }
}

impl<T: Checksum + ?Sized> Checksum for Box<T> {
    fn checksum(&self, data: &str) -> Result<String, PrimitiveError> {
        (**self).checksum(data)
    }
}

impl<T: Digest + ?Sized> Digest for Box<T> {
    fn digest(&mut self, data: &str) -> Result<String, PrimitiveError> {
        (**self).digest(data)
    }
}
