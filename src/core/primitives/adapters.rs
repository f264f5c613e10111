//! Default checksum and digest implementations.

use super::traits::{Checksum, Digest};
use crate::error::PrimitiveError;
use sha2::{Digest as _, Sha256};
use xxhash_rust::xxh3::xxh3_64;

/// Checksum producing the decimal text of the xxh3-64 hash
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Checksum;

impl Xxh3Checksum {
    pub fn new() -> Self {
        Self
    }
}

impl Checksum for Xxh3Checksum {
    fn checksum(&self, data: &str) -> Result<String, PrimitiveError> {
        Ok(xxh3_64(data.as_bytes()).to_string())
    }
}

/// Digest producing the lowercase hex SHA-256 of the input
#[derive(Debug, Clone, Default)]
pub struct Sha256Digest {
    calls: u64,
}

impl Sha256Digest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of digests computed by this instance
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Digest for Sha256Digest {
    fn digest(&mut self, data: &str) -> Result<String, PrimitiveError> {
        self.calls += 1;
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_deterministic_decimal() {
        let checksum = Xxh3Checksum::new();
        let first = checksum.checksum("0").unwrap();
        let second = checksum.checksum("0").unwrap();

        assert_eq!(first, second);
        assert!(first.chars().all(|c| c.is_ascii_digit()));
        assert_ne!(first, checksum.checksum("1").unwrap());
    }

    #[test]
    fn sha256_matches_known_vector() {
        let mut digest = Sha256Digest::new();
        assert_eq!(
            digest.digest("abc").unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest.calls(), 1);
    }
}
