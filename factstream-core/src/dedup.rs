//! Session-scoped novelty filter.
//!
//! A [`DedupStore`] remembers the signatures of every fact already shown. The
//! check and the insert are separate calls, so two concurrent requests can
//! both pass the check for the same fact before either records it; duplicate
//! suppression is best-effort under concurrency.

use dashmap::DashSet;

pub trait DedupStore: Send + Sync {
    /// Membership test against the signatures recorded so far.
    fn is_duplicate(&self, signature: &str) -> bool;

    /// Remember a signature. Recording twice is a no-op.
    fn record(&self, signature: &str);

    /// Number of distinct signatures recorded.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime store: grows monotonically, never pruned, never persisted.
#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    seen: DashSet<String>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedupStore for InMemoryDedupStore {
    fn is_duplicate(&self, signature: &str) -> bool {
        self.seen.contains(signature)
    }

    fn record(&self, signature: &str) {
        if !self.seen.contains(signature) {
            self.seen.insert(signature.to_string());
        }
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use std::sync::Arc;

    #[test]
    fn recorded_signature_matches_rephrasing() {
        let store = InMemoryDedupStore::new();
        assert!(!store.is_duplicate(&normalize("a cat has claws")));

        store.record(&normalize("A cat has claws."));
        assert!(store.is_duplicate(&normalize("a cat has claws")));
        assert!(store.is_duplicate(&normalize("The cat has claws!")));
        assert!(!store.is_duplicate(&normalize("a dog has claws")));
    }

    #[test]
    fn record_is_idempotent() {
        let store = InMemoryDedupStore::new();
        store.record("x");
        store.record("x");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn every_holder_sees_every_insert() {
        let store: Arc<dyn DedupStore> = Arc::new(InMemoryDedupStore::new());
        let other = Arc::clone(&store);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let s = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        s.record(&format!("fact {t}-{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(other.len(), 200);
        assert!(other.is_duplicate("fact 3-49"));
    }
}
