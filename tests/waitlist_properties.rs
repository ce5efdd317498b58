//! Property tests for the waitlist invariants.
//!
//! Invariants under test:
//! - waitlisted positions of an event are always exactly {1..N}
//! - at most one non-cancelled registration per (event, user)
//! - after the synchronous pipeline settles, confirmed count is
//!   min(capacity, active registrations)
//! - under concurrent registrations beyond capacity, exactly `capacity`
//!   rows confirm and the rest waitlist with unique positions

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use gatherly::adapters::memory::InMemoryStore;
use gatherly::application::handlers::waitlist::{PromotionHandler, ReindexHandler};
use gatherly::application::{EventDispatcher, Metrics};
use gatherly::domain::foundation::{LiveEventId, Timestamp, UserId};
use gatherly::domain::live_event::{EventLimits, LiveEvent};
use gatherly::domain::registration::waitlist::{
    plan_promotion, plan_reindex, WaitlistEntry,
};
use gatherly::domain::registration::{Registration, RegistrationStatus};
use gatherly::ports::{LiveEventRepository, RegistrationStore};

#[derive(Debug, Clone)]
enum Op {
    /// Register user `0..USERS`; duplicates are expected to be rejected.
    Register(usize),
    /// Cancel the k-th active registration (mod current count), running the
    /// synchronous promotion/reindex pipeline afterwards.
    Cancel(usize),
}

const USERS: usize = 6;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..USERS).prop_map(Op::Register),
        (0..USERS).prop_map(Op::Cancel),
    ]
}

struct Pipeline {
    store: Arc<InMemoryStore>,
    dispatcher: Arc<EventDispatcher>,
    event: LiveEvent,
    users: Vec<UserId>,
}

async fn pipeline(capacity: i32) -> Pipeline {
    let store = Arc::new(InMemoryStore::new());

    let dispatcher = Arc::new(EventDispatcher::new());
    let promotion = Arc::new(PromotionHandler::new(
        store.clone(),
        Arc::new(Metrics::new()),
    ));
    dispatcher.on_sync("registration.cancelled.v1", promotion);
    dispatcher.on_sync(
        "waitlist.removed.v1",
        Arc::new(ReindexHandler::new(store.clone())),
    );

    let start = Timestamp::now().plus_hours(24);
    let mut event = LiveEvent::new(
        LiveEventId::new(),
        "Property Event".to_string(),
        String::new(),
        start,
        start.plus_hours(1),
        "UTC".to_string(),
        String::new(),
        capacity,
        "org".to_string(),
        &EventLimits::default(),
    )
    .unwrap();
    event.publish();
    store.save(&event).await.unwrap();

    Pipeline {
        store,
        dispatcher,
        event,
        users: (0..USERS).map(|_| UserId::new()).collect(),
    }
}

impl Pipeline {
    async fn apply(&self, op: &Op) {
        match op {
            Op::Register(user_idx) => {
                // Duplicate active registrations are rejected; that's part
                // of the invariant, not a test failure.
                let _ = self
                    .store
                    .admit(&self.event, self.users[*user_idx], None, Default::default())
                    .await;
            }
            Op::Cancel(k) => {
                let mut active: Vec<Registration> = self
                    .store
                    .registrations_for(self.event.id())
                    .await
                    .into_iter()
                    .filter(|r| r.status().is_active())
                    .collect();
                if active.is_empty() {
                    return;
                }
                active.sort_by_key(|r| *r.id());
                let victim = &active[k % active.len()];

                let outcome = self
                    .store
                    .cancel(*victim.id(), Default::default())
                    .await
                    .unwrap();
                self.dispatcher.dispatch(outcome.events).await.unwrap();
            }
        }
    }

    async fn check_invariants(&self, capacity: i32) {
        let rows = self.store.registrations_for(self.event.id()).await;

        // Positions are exactly {1..N}.
        let mut positions: Vec<i32> = rows
            .iter()
            .filter(|r| r.status() == RegistrationStatus::Waitlisted)
            .map(|r| r.position_in_queue().expect("waitlisted row without position"))
            .collect();
        positions.sort_unstable();
        let expected: Vec<i32> = (1..=positions.len() as i32).collect();
        assert_eq!(positions, expected, "waitlist positions not contiguous");

        // Non-waitlisted rows never carry a position.
        assert!(rows
            .iter()
            .filter(|r| r.status() != RegistrationStatus::Waitlisted)
            .all(|r| r.position_in_queue().is_none()));

        // At most one active row per user.
        let mut active_per_user: HashMap<UserId, usize> = HashMap::new();
        for row in rows.iter().filter(|r| r.status().is_active()) {
            *active_per_user.entry(*row.user_id()).or_default() += 1;
        }
        assert!(
            active_per_user.values().all(|&n| n <= 1),
            "duplicate active registration"
        );

        // With the sync pipeline settled, confirmed = min(capacity, active).
        let active = rows.iter().filter(|r| r.status().is_active()).count() as i64;
        let confirmed = rows
            .iter()
            .filter(|r| r.status() == RegistrationStatus::Confirmed)
            .count() as i64;
        assert_eq!(confirmed, active.min(capacity as i64));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn waitlist_invariants_hold_under_arbitrary_histories(
        capacity in 1..4i32,
        ops in proptest::collection::vec(op_strategy(), 1..40),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let p = pipeline(capacity).await;
            for op in &ops {
                p.apply(op).await;
                p.check_invariants(capacity).await;
            }
        });
    }

    #[test]
    fn promotion_plan_is_idempotent(
        capacity in 1..6i32,
        confirmed in 0..6i64,
        positions in proptest::collection::btree_set(1..50i32, 0..8),
    ) {
        let queue: Vec<WaitlistEntry> = positions
            .iter()
            .map(|&position| WaitlistEntry {
                registration_id: gatherly::domain::foundation::RegistrationId::new(),
                user_id: UserId::new(),
                position,
                registered_at: Timestamp::now(),
            })
            .collect();

        let plan = plan_promotion(capacity, confirmed, queue.clone());

        // Apply the plan to the in-memory queue model.
        let survivors: Vec<WaitlistEntry> = queue
            .into_iter()
            .filter(|e| {
                plan.promoted
                    .iter()
                    .all(|p| p.registration_id != e.registration_id)
            })
            .map(|mut e| {
                if let Some(change) = plan
                    .repositioned
                    .iter()
                    .find(|c| c.registration_id == e.registration_id)
                {
                    e.position = change.new_position;
                }
                e
            })
            .collect();

        let new_confirmed = confirmed + plan.promoted.len() as i64;
        let second = plan_promotion(capacity, new_confirmed, survivors.clone());
        prop_assert!(second.is_empty(), "second promotion pass was not a no-op");

        // Survivors hold exactly positions 1..=k.
        let mut survivor_positions: Vec<i32> = survivors.iter().map(|e| e.position).collect();
        survivor_positions.sort_unstable();
        let expected: Vec<i32> = (1..=survivor_positions.len() as i32).collect();
        prop_assert_eq!(survivor_positions, expected);
    }

    #[test]
    fn reindex_always_yields_contiguous_positions(
        positions in proptest::collection::btree_set(1..100i32, 0..10),
    ) {
        let queue: Vec<WaitlistEntry> = positions
            .iter()
            .map(|&position| WaitlistEntry {
                registration_id: gatherly::domain::foundation::RegistrationId::new(),
                user_id: UserId::new(),
                position,
                registered_at: Timestamp::now(),
            })
            .collect();

        let changes = plan_reindex(queue.clone());

        let mut final_positions: Vec<i32> = queue
            .iter()
            .map(|e| {
                changes
                    .iter()
                    .find(|c| c.registration_id == e.registration_id)
                    .map(|c| c.new_position)
                    .unwrap_or(e.position)
            })
            .collect();
        final_positions.sort_unstable();
        let expected: Vec<i32> = (1..=final_positions.len() as i32).collect();
        prop_assert_eq!(final_positions, expected);
    }
}

/// Invariant 5: concurrent registrations beyond capacity settle to exactly
/// `capacity` confirmed rows, the rest waitlisted with unique positions.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_beyond_capacity() {
    let capacity = 5;
    let contenders = 20;

    let p = pipeline(capacity).await;

    let mut tasks = Vec::new();
    for _ in 0..contenders {
        let store = p.store.clone();
        let event = p.event.clone();
        tasks.push(tokio::spawn(async move {
            store
                .admit(&event, UserId::new(), None, Default::default())
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let rows = p.store.registrations_for(p.event.id()).await;
    let confirmed = rows
        .iter()
        .filter(|r| r.status() == RegistrationStatus::Confirmed)
        .count();
    let mut positions: Vec<i32> = rows
        .iter()
        .filter(|r| r.status() == RegistrationStatus::Waitlisted)
        .filter_map(|r| r.position_in_queue())
        .collect();
    positions.sort_unstable();

    assert_eq!(confirmed, capacity as usize);
    assert_eq!(
        positions,
        (1..=(contenders - capacity as usize) as i32).collect::<Vec<_>>()
    );
}
