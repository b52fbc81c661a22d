//! Per-run lookup caches shared by all workers.

use crate::core::models::DomainCandidate;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A read-mostly map populated with write-if-absent semantics.
///
/// Values are deterministic for a given key within one run, so two workers
/// racing to fill the same key cannot disagree; the first write wins.
#[derive(Debug)]
pub struct RunCache<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V> Default for RunCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> RunCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    /// Stores `value` unless the key is already present. Returns the stored value.
    pub fn insert_if_absent(&self, key: impl Into<String>, value: V) -> V {
        let mut entries = self.entries.write();
        entries.entry(key.into()).or_insert(value).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Normalized company name to resolved domain.
pub type DomainCache = RunCache<DomainCandidate>;

/// Domain to mail exchanger hostnames, best preference first.
/// An empty list records a definitive "no MX records" answer.
pub type MxCache = RunCache<Vec<String>>;

/// The caches owned by one run.
#[derive(Debug, Default)]
pub struct RunCaches {
    pub domains: DomainCache,
    pub mx: MxCache,
}

impl RunCaches {
    pub fn new() -> Self {
        Self::default()
    }
}
