//! Post-commit event publication.

use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use pantry_events::{Event, EventBus, EventEnvelope};

/// Publish committed events in order, numbering them from `first_sequence`.
///
/// Runs after the store commit, so a failure here is logged and never undoes
/// the state change.
pub(crate) fn publish_committed<B, E>(
    bus: &B,
    aggregate_type: &str,
    aggregate_id: Uuid,
    first_sequence: u64,
    events: &[E],
) where
    B: EventBus<EventEnvelope<JsonValue>>,
    E: Event + Serialize,
{
    for (offset, event) in events.iter().enumerate() {
        let sequence_number = first_sequence + offset as u64;
        let envelope = match EventEnvelope::from_typed(aggregate_id, aggregate_type, sequence_number, event) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(event_type = event.event_type(), %aggregate_id, error = %err, "event payload serialization failed");
                continue;
            }
        };

        if let Err(err) = bus.publish(envelope) {
            tracing::warn!(event_type = event.event_type(), %aggregate_id, error = ?err, "event publication failed after commit");
        }
    }
}
