//! Domain events and their outbox representation.

pub mod envelope;
pub mod event;

pub use envelope::{EnrichedEvent, EnrichmentError, OutboxStatus};
pub use event::Event;
