use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use pricebook_core::AggregateId;

use crate::event::Event;

/// Delivery status of an outbox record.
///
/// Records are always written as `Pending`. Moving them to `Sent` is the job of
/// the outbox poller, which lives outside this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Sent,
}

impl OutboxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Sent => "sent",
        }
    }
}

impl core::str::FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboxStatus::Pending),
            "sent" => Ok(OutboxStatus::Sent),
            other => Err(format!("unknown outbox status '{other}'")),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A domain event enriched with the metadata needed to persist it in the outbox.
///
/// This is the unit appended to the event store in the same atomic batch as the
/// aggregate write that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    pub event_id: Uuid,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
    pub status: OutboxStatus,
}

impl EnrichedEvent {
    /// Enrich a typed domain event.
    ///
    /// Serializes the event to JSON and copies its type tag, schema version and
    /// business time. The record always starts out `Pending`.
    pub fn from_typed<E>(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        event_id: Uuid,
        event: &E,
    ) -> Result<Self, EnrichmentError>
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event)?;

        Ok(Self {
            event_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
            status: OutboxStatus::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Clone, Serialize)]
    struct Pinged {
        target: String,
        at: DateTime<Utc>,
    }

    impl Event for Pinged {
        fn event_type(&self) -> &'static str {
            "test.pinged"
        }

        fn version(&self) -> u32 {
            2
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    #[test]
    fn from_typed_copies_metadata_and_starts_pending() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let event = Pinged {
            target: "p-1".to_string(),
            at,
        };
        let event_id = Uuid::now_v7();
        let aggregate_id: AggregateId = "p-1".parse().unwrap();

        let enriched =
            EnrichedEvent::from_typed(aggregate_id.clone(), "test", event_id, &event).unwrap();

        assert_eq!(enriched.event_id, event_id);
        assert_eq!(enriched.aggregate_id, aggregate_id);
        assert_eq!(enriched.aggregate_type, "test");
        assert_eq!(enriched.event_type, "test.pinged");
        assert_eq!(enriched.event_version, 2);
        assert_eq!(enriched.occurred_at, at);
        assert_eq!(enriched.status, OutboxStatus::Pending);
        assert_eq!(enriched.payload["target"], "p-1");
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [OutboxStatus::Pending, OutboxStatus::Sent] {
            assert_eq!(status.as_str().parse::<OutboxStatus>().unwrap(), status);
        }
        assert!("delivered".parse::<OutboxStatus>().is_err());
    }
}
