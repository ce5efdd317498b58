//! Pure waitlist planners.
//!
//! Admission, promotion, and reindexing are computed here as pure functions
//! over in-memory rows. Stores call these inside a transaction that holds
//! the event's advisory lock and then apply the returned plan, so the
//! concurrency-sensitive logic stays testable without a database.
//!
//! Canonical ordering is by `position_in_queue ASC`; rows with equal
//! positions (possible only while repairing historical data) tie-break on
//! `(registered_at ASC, id ASC)`.

use crate::domain::foundation::{RegistrationId, Timestamp, UserId};

/// Snapshot of one waitlisted row, as loaded inside the planning transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitlistEntry {
    pub registration_id: RegistrationId,
    pub user_id: UserId,
    pub position: i32,
    pub registered_at: Timestamp,
}

/// Outcome of the admission decision for one new registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A confirmed seat was free.
    Confirmed,
    /// The event was full; join the waitlist at this 1-based position.
    Waitlisted { position: i32 },
}

/// A waitlisted row moving to a new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionChange {
    pub registration_id: RegistrationId,
    pub user_id: UserId,
    pub old_position: i32,
    pub new_position: i32,
}

/// Result of a promotion pass: rows to confirm plus the reindexed remainder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionPlan {
    /// Rows to set Confirmed with position cleared, in promotion order.
    pub promoted: Vec<WaitlistEntry>,
    /// Remaining waitlisted rows whose position changes, in queue order.
    pub repositioned: Vec<PositionChange>,
}

impl PromotionPlan {
    pub fn is_empty(&self) -> bool {
        self.promoted.is_empty() && self.repositioned.is_empty()
    }
}

/// Decides Confirmed vs Waitlisted for a new registration.
///
/// Must be evaluated under the event's advisory lock: `confirmed_count` and
/// `max_position` are only stable while the lock is held. The next waitlist
/// position is `max(position_in_queue) + 1`, never a recount, so positions
/// reflect commit order even if older rows left gaps.
pub fn plan_admission(capacity: i32, confirmed_count: i64, max_position: Option<i32>) -> Admission {
    if confirmed_count < capacity as i64 {
        Admission::Confirmed
    } else {
        Admission::Waitlisted {
            position: max_position.unwrap_or(0) + 1,
        }
    }
}

/// Sorts entries into canonical queue order.
pub fn canonical_order(entries: &mut [WaitlistEntry]) {
    entries.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.registered_at.cmp(&b.registered_at))
            .then_with(|| a.registration_id.cmp(&b.registration_id))
    });
}

/// Plans a promotion pass for an event.
///
/// Fills `max(0, capacity - confirmed_count)` seats from the front of the
/// queue, then compacts the remaining rows to contiguous positions `1..=k`.
/// Applying the same plan twice is harmless: after the first application the
/// promoted rows are no longer waitlisted and the recomputed plan is empty.
pub fn plan_promotion(
    capacity: i32,
    confirmed_count: i64,
    mut waitlisted: Vec<WaitlistEntry>,
) -> PromotionPlan {
    canonical_order(&mut waitlisted);

    let slots = (capacity as i64 - confirmed_count).max(0) as usize;
    let promote_count = slots.min(waitlisted.len());

    let remainder = waitlisted.split_off(promote_count);

    PromotionPlan {
        promoted: waitlisted,
        repositioned: compact(remainder),
    }
}

/// Plans a reindex pass: closes gaps so positions are exactly `1..=N`.
pub fn plan_reindex(mut waitlisted: Vec<WaitlistEntry>) -> Vec<PositionChange> {
    canonical_order(&mut waitlisted);
    compact(waitlisted)
}

/// Plans an admin confirm of one specific waitlisted row: promote it out of
/// order, then reindex the remainder. Returns `None` if the target is not in
/// the queue (a Pending row needs no queue surgery).
pub fn plan_confirm(
    target: RegistrationId,
    mut waitlisted: Vec<WaitlistEntry>,
) -> Option<PromotionPlan> {
    canonical_order(&mut waitlisted);

    let index = waitlisted
        .iter()
        .position(|e| e.registration_id == target)?;
    let promoted = waitlisted.remove(index);

    Some(PromotionPlan {
        promoted: vec![promoted],
        repositioned: compact(waitlisted),
    })
}

/// Assigns positions 1..=N in queue order, reporting only actual moves.
fn compact(ordered: Vec<WaitlistEntry>) -> Vec<PositionChange> {
    ordered
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let new_position = idx as i32 + 1;
            if entry.position != new_position {
                Some(PositionChange {
                    registration_id: entry.registration_id,
                    user_id: entry.user_id,
                    old_position: entry.position,
                    new_position,
                })
            } else {
                None
            }
        })
        .collect()
}
