//! The shared serialization token around the digest primitive.

use super::traits::Digest;
use crate::error::PrimitiveError;
use std::sync::{Mutex, PoisonError};

/// Owns a [`Digest`] and lets shared callers use it one at a time.
///
/// The lock is held only for the duration of the digest call. It is
/// released on every exit path, unwinding included, and a poisoned lock is
/// recovered instead of locking out later callers.
pub struct SerializedDigest {
    inner: Mutex<Box<dyn Digest>>,
}

impl SerializedDigest {
    pub fn new<D: Digest + 'static>(digest: D) -> Self {
        Self {
            inner: Mutex::new(Box::new(digest)),
        }
    }

    /// Compute a digest while holding the token
    pub fn digest(&self, data: &str) -> Result<String, PrimitiveError> {
        let mut primitive = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        primitive.digest(data)
    }
}

impl std::fmt::Debug for SerializedDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedDigest").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// Fails if a second call arrives while one is still in flight
    struct ReentryDetector {
        in_flight: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    impl Digest for ReentryDetector {
        fn digest(&mut self, data: &str) -> Result<String, PrimitiveError> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                return Err(PrimitiveError::DigestFailed {
                    input: data.to_string(),
                    reason: "re-entered".to_string(),
                });
            }
            thread::sleep(Duration::from_millis(1));
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.in_flight.store(false, Ordering::SeqCst);
            Ok(data.to_uppercase())
        }
    }

    struct Exploding;

    impl Digest for Exploding {
        fn digest(&mut self, data: &str) -> Result<String, PrimitiveError> {
            if data == "boom" {
                panic!("digest exploded");
            }
            Ok(data.to_string())
        }
    }

    #[test]
    fn concurrent_callers_never_overlap() {
        let calls = Arc::new(AtomicUsize::new(0));
        let token = SerializedDigest::new(ReentryDetector {
            in_flight: Arc::new(AtomicBool::new(false)),
            calls: Arc::clone(&calls),
        });

        thread::scope(|scope| {
            for i in 0..16 {
                let token = &token;
                scope.spawn(move || {
                    for j in 0..4 {
                        token.digest(&format!("{i}-{j}")).unwrap();
                    }
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 64);
    }

    #[test]
    fn panicking_digest_does_not_lock_out_callers() {
        let token = SerializedDigest::new(Exploding);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| token.digest("boom")));
        assert!(outcome.is_err());

        assert_eq!(token.digest("fine").unwrap(), "fine");
    }
}
