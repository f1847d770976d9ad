//! Change markers and the ancestor-set memo
//!
//! Derived change data is memoized under the tree's [`ChangeMarker`]; every
//! mutation produces a new marker, so entries recorded under an older marker
//! can never be returned again.

use moka::sync::Cache;
use optree_core::{Attribute, ChangeLayer};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Mutation counter of one option tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ChangeMarker(u64);

impl ChangeMarker {
    /// Marker following this one
    #[inline]
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Number of mutations seen
    #[inline]
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChangeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared set of attributes with changed descendants
pub type AncestorSet = Arc<BTreeSet<Attribute>>;

/// Memo of ancestor sets keyed by layer and marker
pub(crate) struct AncestorMemo {
    capacity: u64,
    inner: Cache<(ChangeLayer, ChangeMarker), AncestorSet>,
}

impl AncestorMemo {
    pub(crate) fn new(capacity: u64) -> Self {
        Self {
            capacity,
            inner: Cache::new(capacity),
        }
    }

    /// Get the set recorded for `(layer, marker)` or compute and record it
    pub(crate) fn get_or_compute<F>(&self, layer: ChangeLayer, marker: ChangeMarker, f: F) -> AncestorSet
    where
        F: FnOnce() -> BTreeSet<Attribute>,
    {
        self.inner.get_with((layer, marker), || Arc::new(f()))
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, layer: ChangeLayer, marker: ChangeMarker) -> bool {
        self.inner.contains_key(&(layer, marker))
    }
}

/// Clones start empty; the cache handle would otherwise be shared
impl Clone for AncestorMemo {
    fn clone(&self) -> Self {
        Self::new(self.capacity)
    }
}

impl fmt::Debug for AncestorMemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AncestorMemo")
            .field("capacity", &self.capacity)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn marker_advances() {
        let marker = ChangeMarker::default();
        assert_eq!(marker.generation(), 0);
        assert!(marker.next() > marker);
        assert_ne!(marker.next(), marker);
    }

    #[test]
    fn memo_computes_once_per_marker() {
        let memo = AncestorMemo::new(8);
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            BTreeSet::from([Attribute::root()])
        };

        let marker = ChangeMarker::default();
        let first = memo.get_or_compute(ChangeLayer::InMemory, marker, compute);
        let second = memo.get_or_compute(ChangeLayer::InMemory, marker, compute);
        assert_eq!(calls.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(memo.contains(ChangeLayer::InMemory, marker));

        memo.get_or_compute(ChangeLayer::InMemory, marker.next(), compute);
        memo.get_or_compute(ChangeLayer::Configured, marker, compute);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn clone_starts_empty() {
        let memo = AncestorMemo::new(8);
        let marker = ChangeMarker::default();
        memo.get_or_compute(ChangeLayer::InMemory, marker, BTreeSet::new);
        let cloned = memo.clone();
        assert!(!cloned.contains(ChangeLayer::InMemory, marker));
    }
}
