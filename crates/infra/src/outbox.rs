//! Transactional outbox: enriched events as rows of `outbox_events`.
//!
//! Like the aggregate repositories, the outbox only produces [`WriteOp`]s. The
//! rows land in the same atomic batch as the state change that raised them and
//! are picked up later by a separate poller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use pricebook_core::AggregateId;
use pricebook_events::{EnrichedEvent, OutboxStatus};

use crate::mutation::{ColumnKind, ColumnValue, Row, TableSchema, WriteOp};
use crate::store::StoreError;

pub const EVENT_ID: &str = "event_id";
pub const EVENT_TYPE: &str = "event_type";
pub const AGGREGATE_ID: &str = "aggregate_id";
pub const AGGREGATE_TYPE: &str = "aggregate_type";
pub const EVENT_VERSION: &str = "event_version";
pub const PAYLOAD: &str = "payload";
pub const STATUS: &str = "status";
pub const OCCURRED_AT: &str = "occurred_at";
pub const CREATED_AT: &str = "created_at";
pub const PROCESSED_AT: &str = "processed_at";

pub static OUTBOX_EVENTS: TableSchema = TableSchema {
    name: "outbox_events",
    key_column: EVENT_ID,
    columns: &[
        (EVENT_ID, ColumnKind::Text),
        (EVENT_TYPE, ColumnKind::Text),
        (AGGREGATE_ID, ColumnKind::Text),
        (AGGREGATE_TYPE, ColumnKind::Text),
        (EVENT_VERSION, ColumnKind::Int),
        (PAYLOAD, ColumnKind::Json),
        (STATUS, ColumnKind::Text),
        (OCCURRED_AT, ColumnKind::Timestamp),
        (CREATED_AT, ColumnKind::Timestamp),
        (PROCESSED_AT, ColumnKind::Timestamp),
    ],
};

/// Builds outbox inserts.
pub trait OutboxStore: Send + Sync {
    fn insert_op(&self, event: &EnrichedEvent) -> Result<WriteOp, StoreError>;
}

impl<T: OutboxStore + ?Sized> OutboxStore for Arc<T> {
    fn insert_op(&self, event: &EnrichedEvent) -> Result<WriteOp, StoreError> {
        (**self).insert_op(event)
    }
}

/// The `outbox_events` table mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutboxRepository;

impl OutboxRepository {
    pub fn new() -> Self {
        Self
    }
}

impl OutboxStore for OutboxRepository {
    fn insert_op(&self, event: &EnrichedEvent) -> Result<WriteOp, StoreError> {
        let row = Row::new()
            .with(EVENT_ID, event.event_id.to_string())
            .with(EVENT_TYPE, event.event_type.as_str())
            .with(AGGREGATE_ID, event.aggregate_id.as_str())
            .with(AGGREGATE_TYPE, event.aggregate_type.as_str())
            .with(EVENT_VERSION, i64::from(event.event_version))
            .with(PAYLOAD, ColumnValue::Json(event.payload.clone()))
            .with(STATUS, event.status.as_str())
            .with(OCCURRED_AT, event.occurred_at)
            .with(CREATED_AT, event.occurred_at)
            .with(PROCESSED_AT, None::<DateTime<Utc>>);

        Ok(WriteOp::Insert {
            table: &OUTBOX_EVENTS,
            key: event.event_id.to_string(),
            row,
        })
    }
}

/// A stored outbox row, decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxRecord {
    pub event_id: Uuid,
    pub event_type: String,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,
    pub event_version: u32,
    pub payload: JsonValue,
    pub status: OutboxStatus,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxRecord {
    pub fn from_row(row: &Row) -> Result<Self, StoreError> {
        let event_id = Uuid::parse_str(row.text(EVENT_ID)?)
            .map_err(|e| StoreError::Corrupt(format!("event_id: {e}")))?;
        let aggregate_id = row
            .text(AGGREGATE_ID)?
            .parse::<AggregateId>()
            .map_err(|e| StoreError::Corrupt(format!("aggregate_id: {e}")))?;
        let event_version = u32::try_from(row.int(EVENT_VERSION)?)
            .map_err(|e| StoreError::Corrupt(format!("event_version: {e}")))?;
        let status = row
            .text(STATUS)?
            .parse::<OutboxStatus>()
            .map_err(StoreError::Corrupt)?;

        Ok(Self {
            event_id,
            event_type: row.text(EVENT_TYPE)?.to_string(),
            aggregate_id,
            aggregate_type: row.text(AGGREGATE_TYPE)?.to_string(),
            event_version,
            payload: row.json(PAYLOAD)?.clone(),
            status,
            occurred_at: row.timestamp(OCCURRED_AT)?,
            created_at: row.timestamp(CREATED_AT)?,
            processed_at: row.opt_timestamp(PROCESSED_AT)?,
        })
    }
}
