//! Per-aggregate dirty-field ledger.

use std::collections::BTreeSet;

/// Tracks which fields of an aggregate were mutated since the last commit.
///
/// Used only to build minimal persisted updates; business rules never read it.
/// Iteration order is the field type's `Ord` order, so generated updates are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeTracker<F: Ord> {
    dirty: BTreeSet<F>,
}

impl<F: Ord + Copy> ChangeTracker<F> {
    pub fn new() -> Self {
        Self {
            dirty: BTreeSet::new(),
        }
    }

    pub fn mark_dirty(&mut self, field: F) {
        self.dirty.insert(field);
    }

    pub fn is_dirty(&self, field: F) -> bool {
        self.dirty.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty.len()
    }

    pub fn dirty_fields(&self) -> impl Iterator<Item = F> + '_ {
        self.dirty.iter().copied()
    }

    /// Reset all dirty flags. Called after a confirmed successful commit.
    pub fn clear(&mut self) {
        self.dirty.clear();
    }
}

impl<F: Ord + Copy> Default for ChangeTracker<F> {
    fn default() -> Self {
        Self::new()
    }
}
