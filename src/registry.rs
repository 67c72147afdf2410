//! Registry of content digests already seen
//!
//! The registry is the only state shared between concurrent download tasks.
//! Every check and every insert goes through a single mutex, and the only
//! operation tasks get is [`Registry::try_insert`], so there is no window in
//! which two tasks can both observe a digest as absent.

use crate::hash::Digest;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors reported by a registry implementation
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    #[error("Registry rejected digest {digest}: {reason}")]
    Rejected { digest: Digest, reason: String },
}

/// Add-if-absent set of digests shared across download tasks
///
/// Implementations must make `try_insert` atomic with respect to every other
/// call on the same registry.
pub trait Registry: Send + Sync {
    /// Records `digest` if absent
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The digest was new and is now recorded
    /// * `Ok(false)` - The digest was already present; nothing changed
    /// * `Err(RegistryError)` - The registry could not answer
    fn try_insert(&self, digest: Digest) -> Result<bool, RegistryError>;

    /// Returns every recorded digest, in no particular order
    fn snapshot(&self) -> Vec<Digest>;
}

/// Mutex-guarded in-memory digest set
#[derive(Debug, Default)]
pub struct SeenRegistry {
    seen: Mutex<HashSet<Digest>>,
}

impl SeenRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with digests from a previous run
    pub fn from_digests<I>(digests: I) -> Self
    where
        I: IntoIterator<Item = Digest>,
    {
        Self {
            seen: Mutex::new(digests.into_iter().collect()),
        }
    }

    /// Records `digest` if absent, returning whether it was new
    pub fn try_insert(&self, digest: Digest) -> bool {
        // A panic elsewhere cannot leave the set half-updated, so a poisoned
        // lock still guards a consistent set.
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.insert(digest)
    }

    /// Number of recorded digests
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every recorded digest
    pub fn snapshot(&self) -> Vec<Digest> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }
}

impl Registry for SeenRegistry {
    fn try_insert(&self, digest: Digest) -> Result<bool, RegistryError> {
        Ok(SeenRegistry::try_insert(self, digest))
    }

    fn snapshot(&self) -> Vec<Digest> {
        SeenRegistry::snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_insert_once() {
        let registry = SeenRegistry::new();
        let digest = hash_bytes(b"first");

        assert!(registry.try_insert(digest));
        assert!(!registry.try_insert(digest));
        assert!(!registry.try_insert(digest));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_digests() {
        let a = hash_bytes(b"a");
        let b = hash_bytes(b"b");
        let registry = SeenRegistry::from_digests(vec![a, b]);

        assert_eq!(registry.len(), 2);
        assert!(!registry.try_insert(a));
        assert!(registry.try_insert(hash_bytes(b"c")));

        let mut snapshot = registry.snapshot();
        snapshot.sort();
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_empty() {
        let registry = SeenRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_inserts_accept_each_digest_once() {
        let registry = Arc::new(SeenRegistry::new());
        let accepted = Arc::new(AtomicUsize::new(0));
        let digests: Vec<Digest> = (0..64u32).map(|i| hash_bytes(&i.to_le_bytes())).collect();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let accepted = Arc::clone(&accepted);
                let digests = digests.clone();
                std::thread::spawn(move || {
                    for digest in digests {
                        if registry.try_insert(digest) {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(accepted.load(Ordering::SeqCst), 64);
        assert_eq!(registry.len(), 64);
    }

    #[test]
    fn test_trait_object_delegates() {
        let registry: Arc<dyn Registry> = Arc::new(SeenRegistry::new());
        let digest = hash_bytes(b"trait");

        assert!(registry.try_insert(digest).unwrap());
        assert!(!registry.try_insert(digest).unwrap());
        assert_eq!(registry.snapshot(), vec![digest]);
    }
}
