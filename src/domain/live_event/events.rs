//! Domain events emitted by the LiveEvent aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, LiveEventId, Timestamp};
use crate::domain_event;

/// Capacity grew; up to `additional` waitlisted rows may be promoted.
///
/// Routed synchronously: the promotion pass must complete before the update
/// command returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCapacityIncreased {
    pub event_id: EventId,
    pub live_event_id: LiveEventId,
    pub additional: i32,
    pub new_capacity: i32,
    pub occurred_at: Timestamp,
}

domain_event!(
    EventCapacityIncreased,
    event_type = "event.capacity_increased.v1",
    aggregate_id = live_event_id,
    aggregate_type = "LiveEvent",
    occurred_at = occurred_at,
    event_id = event_id
);
