//! Command execution pipeline (application-level orchestration).
//!
//! Every state change goes through one atomic write:
//!
//! ```text
//! Command
//!   ↓
//! 1. Load aggregate (or construct a new one)
//!   ↓
//! 2. Run the domain method (pure, records dirty fields and events)
//!   ↓
//! 3. Build one MutationBatch:
//!      - the aggregate insert, or an update of its dirty columns only
//!      - one outbox insert per pending event, in emission order
//!   ↓
//! 4. Apply the batch atomically through the Committer
//!   ↓
//! 5. On success only: clear pending events and dirty flags
//! ```
//!
//! A state change is never stored without its events, and an event is never
//! stored without its state change. If the commit fails, the aggregate keeps
//! its pending events and dirty flags so the caller can inspect or retry.
//!
//! This module contains no IO itself; it composes infrastructure traits.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use pricebook_core::{AggregateId, AggregateRoot, DomainError};
use pricebook_events::{EnrichedEvent, EnrichmentError, Event};

use crate::clock::Clock;
use crate::committer::{CommitError, Committer};
use crate::mutation::MutationBatch;
use crate::outbox::OutboxStore;
use crate::store::{AggregateStore, StoreError};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed command input (blank name, bad fraction, percentage out of range).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("product is not active")]
    ProductNotActive,

    #[error("discount is not valid at the current time")]
    InvalidDiscountPeriod,

    #[error("not found")]
    NotFound,

    /// The atomic batch was rejected; nothing was written.
    #[error("commit failed: {0}")]
    CommitFailed(#[from] CommitError),

    #[error("event enrichment failed: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::ProductNotActive => DispatchError::ProductNotActive,
            DomainError::InvalidDiscountPeriod => DispatchError::InvalidDiscountPeriod,
            DomainError::NotFound => DispatchError::NotFound,
            other @ (DomainError::InvalidInput(_)
            | DomainError::InvalidDenominator
            | DomainError::InvalidDiscount(_)) => DispatchError::InvalidInput(other.to_string()),
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => DispatchError::NotFound,
            other => DispatchError::Store(other),
        }
    }
}

/// How the aggregate row enters the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateWrite {
    /// Newly constructed aggregate: full-row insert.
    Insert,
    /// Loaded aggregate: update of dirty columns only.
    Update,
}

/// What a successful commit wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitOutcome {
    pub aggregate_written: bool,
    pub events_written: usize,
}

impl CommitOutcome {
    pub fn is_noop(&self) -> bool {
        !self.aggregate_written && self.events_written == 0
    }
}

/// Reusable atomic-write engine for state-persisted aggregates with an outbox.
///
/// ## Generic Parameters
///
/// - `S`: aggregate repository (row mapping for the aggregate table)
/// - `O`: outbox repository (row mapping for `outbox_events`)
/// - `C`: committer (applies a batch all-or-nothing)
/// - `K`: clock
#[derive(Debug)]
pub struct MutationDispatcher<S, O, C, K> {
    store: S,
    outbox: O,
    committer: C,
    clock: K,
}

impl<S, O, C, K> MutationDispatcher<S, O, C, K> {
    pub fn new(store: S, outbox: O, committer: C, clock: K) -> Self {
        Self {
            store,
            outbox,
            committer,
            clock,
        }
    }
}

impl<S, O, C, K> MutationDispatcher<S, O, C, K>
where
    O: OutboxStore,
    C: Committer,
    K: Clock,
{
    /// Current time, read once per operation.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Load an aggregate through the repository.
    pub fn load<A>(&self, id: &A::Id) -> Result<A, DispatchError>
    where
        A: AggregateRoot,
        S: AggregateStore<A>,
    {
        Ok(self.store.find_by_id(id)?)
    }

    /// Persist an aggregate's state change and its pending events atomically.
    ///
    /// The batch holds the aggregate write (if any) followed by one outbox
    /// insert per pending event, in emission order. An empty batch skips the
    /// committer entirely. After a successful commit the aggregate's pending
    /// events and dirty flags are cleared; after a failure both are kept.
    #[instrument(skip(self, aggregate), err)]
    pub fn commit<A>(
        &self,
        aggregate: &mut A,
        aggregate_type: &'static str,
        write: AggregateWrite,
    ) -> Result<CommitOutcome, DispatchError>
    where
        A: AggregateRoot,
        A::Id: Into<AggregateId>,
        A::Event: Event + Serialize,
        S: AggregateStore<A>,
    {
        let batch = self.build_batch(aggregate, aggregate_type, write)?;
        let outcome = CommitOutcome {
            aggregate_written: batch.len() > aggregate.pending_events().len(),
            events_written: aggregate.pending_events().len(),
        };

        if batch.is_empty() {
            debug!("nothing to commit");
            return Ok(outcome);
        }

        let ops = batch.len();
        if let Err(e) = self.committer.apply(batch) {
            warn!(error = %e, ops, "atomic commit failed; aggregate left uncommitted");
            return Err(e.into());
        }

        aggregate.mark_committed();
        debug!(ops, events = outcome.events_written, "atomic commit succeeded");
        Ok(outcome)
    }

    /// Assemble the batch without applying it.
    pub fn build_batch<A>(
        &self,
        aggregate: &A,
        aggregate_type: &'static str,
        write: AggregateWrite,
    ) -> Result<MutationBatch, DispatchError>
    where
        A: AggregateRoot,
        A::Id: Into<AggregateId>,
        A::Event: Event + Serialize,
        S: AggregateStore<A>,
    {
        let mut batch = MutationBatch::new();

        let aggregate_op = match write {
            AggregateWrite::Insert => Some(self.store.insert_op(aggregate)?),
            AggregateWrite::Update => self.store.update_op(aggregate)?,
        };
        if let Some(op) = aggregate_op {
            batch.push(op);
        }

        let aggregate_id: AggregateId = aggregate.id().clone().into();
        for event in aggregate.pending_events() {
            let enriched = EnrichedEvent::from_typed(
                aggregate_id.clone(),
                aggregate_type,
                Uuid::now_v7(),
                event,
            )?;
            batch.push(self.outbox.insert_op(&enriched)?);
        }

        Ok(batch)
    }
}
