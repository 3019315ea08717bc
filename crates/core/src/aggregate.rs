//! Aggregate root trait for state-persisted domain models with an outbox.

use crate::change_tracker::ChangeTracker;

/// Aggregate root marker + minimal interface.
///
/// An aggregate is mutated only through its own methods. Each mutation records
/// the fields it touched in a [`ChangeTracker`] and appends domain events to a
/// pending list. Infrastructure turns both into one atomic batch and, once
/// that batch is committed, calls [`AggregateRoot::mark_committed`].
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Domain event type produced by this aggregate.
    type Event: Clone + core::fmt::Debug;

    /// Identifier of a persisted attribute (used for minimal updates).
    type Field: Copy + Ord + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Events raised since the last successful commit, in emission order.
    fn pending_events(&self) -> &[Self::Event];

    /// Fields mutated since the last successful commit.
    fn changes(&self) -> &ChangeTracker<Self::Field>;

    /// Reset pending events and dirty flags.
    ///
    /// Must only be called after the batch built from this aggregate has been
    /// durably committed.
    fn mark_committed(&mut self);
}
