//! End-to-end scenarios over the in-memory adapters: the full command →
//! dispatcher → outbox → worker pipeline, without postgres or redis.

use std::sync::Arc;
use std::time::Duration;

use gatherly::adapters::events::{
    EventRouter, IdempotentHandler, InMemoryNotificationBus, QueueWorker, QueueWorkerConfig,
};
use gatherly::adapters::idempotency::InMemoryIdempotencyStore;
use gatherly::adapters::memory::{InMemoryProcessedEventStore, InMemoryStore};
use gatherly::application::handlers::registration::{
    CancelRegistrationCommand, CancelRegistrationHandler, RegisterCommand, RegisterHandler,
};
use gatherly::application::handlers::live_event::{UpdateEventCommand, UpdateEventHandler};
use gatherly::application::handlers::waitlist::{
    PositionNotifier, PromotionHandler, ReindexHandler,
};
use gatherly::application::{EventDispatcher, Metrics};
use gatherly::domain::foundation::{
    CommandMetadata, ErrorCode, LiveEventId, Requester, Timestamp, UserId,
};
use gatherly::domain::live_event::{EventLimits, EventPatch, LiveEvent};
use gatherly::domain::registration::{RegistrationStatus, Registration};
use gatherly::domain::user::User;
use gatherly::ports::{
    EventSubscriber, LiveEventRepository, OutboxStatus, OutboxStore, RegistrationStore,
    UserRepository,
};

/// Everything wired the way main.rs wires production, on memory backends.
struct Harness {
    store: Arc<InMemoryStore>,
    dispatcher: Arc<EventDispatcher>,
    notifications: Arc<InMemoryNotificationBus>,
    register: RegisterHandler,
    cancel: CancelRegistrationHandler,
    update: UpdateEventHandler,
    metrics: Arc<Metrics>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let metrics = Arc::new(Metrics::new());
        let notifications = Arc::new(InMemoryNotificationBus::new());

        let dispatcher = Arc::new(EventDispatcher::new());
        let promotion = Arc::new(PromotionHandler::new(store.clone(), metrics.clone()));
        dispatcher.on_sync("registration.cancelled.v1", promotion.clone());
        dispatcher.on_sync("event.capacity_increased.v1", promotion);
        dispatcher.on_sync(
            "waitlist.removed.v1",
            Arc::new(ReindexHandler::new(store.clone())),
        );
        dispatcher.on_sync(
            "waitlist.position_changed.v1",
            Arc::new(PositionNotifier::new(
                store.clone(),
                store.clone(),
                notifications.clone(),
            )),
        );

        let register = RegisterHandler::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(InMemoryIdempotencyStore::new()),
            metrics.clone(),
            Duration::from_secs(600),
        );
        let cancel = CancelRegistrationHandler::new(
            store.clone(),
            store.clone(),
            dispatcher.clone(),
            metrics.clone(),
        );
        let update = UpdateEventHandler::new(
            store.clone(),
            store.clone(),
            dispatcher.clone(),
            Arc::new(gatherly::adapters::cache::InMemoryCacheStore::new()),
            EventLimits::default(),
        );

        Self {
            store,
            dispatcher,
            notifications,
            register,
            cancel,
            update,
            metrics,
        }
    }

    async fn seed_event(&self, capacity: i32) -> LiveEvent {
        let start = Timestamp::now().plus_hours(24);
        let mut event = LiveEvent::new(
            LiveEventId::new(),
            "Live Show".to_string(),
            String::new(),
            start,
            start.plus_hours(2),
            "UTC".to_string(),
            "Arena".to_string(),
            capacity,
            "organizer-1".to_string(),
            &EventLimits::default(),
        )
        .unwrap();
        event.publish();
        LiveEventRepository::save(self.store.as_ref(), &event)
            .await
            .unwrap();
        event
    }

    async fn seed_user(&self, subject: &str) -> User {
        let user = User::new(
            UserId::new(),
            subject.to_string(),
            format!("{}@example.com", subject),
            subject.to_string(),
            "Tester".to_string(),
            None,
        )
        .unwrap();
        UserRepository::save(self.store.as_ref(), &user)
            .await
            .unwrap();
        user
    }

    async fn register_as(&self, subject: &str, event: &LiveEvent) -> Registration {
        self.register
            .handle(
                RegisterCommand {
                    live_event_id: *event.id(),
                    notes: None,
                    idempotency_nonce: None,
                },
                CommandMetadata::new(Requester::user(subject)),
            )
            .await
            .unwrap()
            .registration
    }

    async fn cancel_as_admin(&self, registration: &Registration) {
        self.cancel
            .handle(
                CancelRegistrationCommand {
                    registration_id: *registration.id(),
                },
                CommandMetadata::new(Requester::admin("admin-1")),
            )
            .await
            .unwrap();
    }

    async fn rows(&self, event: &LiveEvent) -> Vec<Registration> {
        self.store.registrations_for(event.id()).await
    }

    async fn status_of(&self, registration: &Registration) -> (RegistrationStatus, Option<i32>) {
        let row = RegistrationStore::find_registration(self.store.as_ref(), registration.id())
            .await
            .unwrap()
            .unwrap();
        (row.status(), row.position_in_queue())
    }
}

/// S1: two concurrent registrations on a capacity-1 event; first committer
/// confirmed, second waitlisted at position 1.
#[tokio::test]
async fn s1_concurrent_registrations_fill_then_waitlist() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    h.seed_user("ua").await;
    h.seed_user("ub").await;

    let reg_a = {
        let event = event.clone();
        let store = h.store.clone();
        let metrics = h.metrics.clone();
        tokio::spawn(async move {
            let handler = RegisterHandler::new(
                store.clone(),
                store.clone(),
                store.clone(),
                Arc::new(InMemoryIdempotencyStore::new()),
                metrics,
                Duration::from_secs(600),
            );
            handler
                .handle(
                    RegisterCommand {
                        live_event_id: *event.id(),
                        notes: None,
                        idempotency_nonce: None,
                    },
                    CommandMetadata::new(Requester::user("ua")),
                )
                .await
        })
    };
    let reg_b = h.register_as("ub", &event);

    let (a, b) = tokio::join!(reg_a, reg_b);
    let a = a.unwrap().unwrap().registration;

    let mut statuses = vec![
        (a.status(), a.position_in_queue()),
        (b.status(), b.position_in_queue()),
    ];
    statuses.sort_by_key(|(s, _)| s.as_i16());

    assert_eq!(
        statuses,
        vec![
            (RegistrationStatus::Confirmed, None),
            (RegistrationStatus::Waitlisted, Some(1)),
        ]
    );
}

/// S2: cancellation promotes the queue front and keeps positions contiguous.
#[tokio::test]
async fn s2_cancellation_cascade_promotes_in_order() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    h.seed_user("ua").await;
    h.seed_user("ub").await;
    h.seed_user("uc").await;

    let a = h.register_as("ua", &event).await;
    let b = h.register_as("ub", &event).await;
    let c = h.register_as("uc", &event).await;

    assert_eq!(h.status_of(&b).await, (RegistrationStatus::Waitlisted, Some(1)));
    assert_eq!(h.status_of(&c).await, (RegistrationStatus::Waitlisted, Some(2)));

    h.cancel_as_admin(&a).await;
    assert_eq!(h.status_of(&b).await, (RegistrationStatus::Confirmed, None));
    assert_eq!(h.status_of(&c).await, (RegistrationStatus::Waitlisted, Some(1)));

    h.cancel_as_admin(&b).await;
    assert_eq!(h.status_of(&c).await, (RegistrationStatus::Confirmed, None));

    let waitlisted = h
        .rows(&event)
        .await
        .into_iter()
        .filter(|r| r.status() == RegistrationStatus::Waitlisted)
        .count();
    assert_eq!(waitlisted, 0);
}

/// S3: a capacity increase promotes waitlisted rows and is emitted exactly
/// once with the right delta.
#[tokio::test]
async fn s3_capacity_increase_promotes_waitlist() {
    use gatherly::application::SyncEventHandler;
    use gatherly::domain::foundation::{DomainError, EventEnvelope};
    use gatherly::domain::live_event::EventCapacityIncreased;
    use std::sync::Mutex;

    struct CaptureCapacity(Arc<Mutex<Vec<i32>>>);

    #[async_trait::async_trait]
    impl SyncEventHandler for CaptureCapacity {
        async fn handle(
            &self,
            envelope: &EventEnvelope,
        ) -> Result<Vec<EventEnvelope>, DomainError> {
            let event: EventCapacityIncreased = envelope.payload_as().unwrap();
            self.0.lock().unwrap().push(event.additional);
            Ok(Vec::new())
        }

        fn name(&self) -> &'static str {
            "CaptureCapacity"
        }
    }

    let h = Harness::new();
    let captured = Arc::new(Mutex::new(Vec::new()));
    h.dispatcher.on_sync(
        "event.capacity_increased.v1",
        Arc::new(CaptureCapacity(captured.clone())),
    );

    let event = h.seed_event(1).await;
    h.seed_user("ua").await;
    h.seed_user("ub").await;

    h.register_as("ua", &event).await;
    let b = h.register_as("ub", &event).await;

    h.update
        .handle(
            UpdateEventCommand {
                live_event_id: *event.id(),
                patch: EventPatch {
                    capacity: Some(3),
                    ..Default::default()
                },
            },
            CommandMetadata::new(Requester::admin("admin-1")),
        )
        .await
        .unwrap();

    assert_eq!(h.status_of(&b).await, (RegistrationStatus::Confirmed, None));
    let waitlisted = h
        .rows(&event)
        .await
        .into_iter()
        .filter(|r| r.status() == RegistrationStatus::Waitlisted)
        .count();
    assert_eq!(waitlisted, 0);

    // Emitted exactly once, with additional = 2.
    assert_eq!(*captured.lock().unwrap(), vec![2]);
}

/// S4: registering for an unpublished event is rejected and leaves no
/// outbox row behind.
#[tokio::test]
async fn s4_unpublished_event_rejects_registration_without_outbox_rows() {
    let h = Harness::new();
    let mut event = h.seed_event(5).await;
    event.unpublish();
    LiveEventRepository::update(h.store.as_ref(), &event)
        .await
        .unwrap();
    h.seed_user("ua").await;

    let err = h
        .register
        .handle(
            RegisterCommand {
                live_event_id: *event.id(),
                notes: None,
                idempotency_nonce: None,
            },
            CommandMetadata::new(Requester::user("ua")),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::EventNotPublished);
    assert_eq!(h.store.outbox_len().await, 0);
}

/// S5: two POSTs with the same idempotency key produce one row and the
/// same registration id.
#[tokio::test]
async fn s5_idempotent_replay_returns_first_registration() {
    let h = Harness::new();
    let event = h.seed_event(5).await;
    h.seed_user("ua").await;

    let cmd = RegisterCommand {
        live_event_id: *event.id(),
        notes: None,
        idempotency_nonce: Some("client-nonce-1".to_string()),
    };

    let first = h
        .register
        .handle(cmd.clone(), CommandMetadata::new(Requester::user("ua")))
        .await
        .unwrap();
    let second = h
        .register
        .handle(cmd, CommandMetadata::new(Requester::user("ua")))
        .await
        .unwrap();

    assert!(!first.replayed);
    assert!(second.replayed);
    assert_eq!(first.registration.id(), second.registration.id());
    assert_eq!(h.rows(&event).await.len(), 1);
}

/// S6: delivery fails three times, succeeds on the fourth; the handler
/// observes the event once logically and the row ends Processed with
/// try_count = 4.
#[tokio::test]
async fn s6_retries_until_success_with_exactly_one_logical_delivery() {
    use async_trait::async_trait;
    use gatherly::domain::foundation::{DomainError, EventEnvelope};
    use gatherly::ports::EventHandler;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyThenCounting {
        failures_left: AtomicUsize,
        successes: AtomicUsize,
    }

    #[async_trait]
    impl EventHandler for FlakyThenCounting {
        async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                Err(DomainError::new(ErrorCode::QueueError, "downstream down"))
            } else {
                self.successes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "FlakyThenCounting"
        }
    }

    let h = Harness::new();
    let event = h.seed_event(5).await;
    h.seed_user("ua").await;

    let handler = Arc::new(FlakyThenCounting {
        failures_left: AtomicUsize::new(3),
        successes: AtomicUsize::new(0),
    });

    let router = Arc::new(EventRouter::new());
    router.register_type::<gatherly::domain::registration::RegistrationCreated>(
        "registration.created.v1",
    );
    router.subscribe(
        "registration.created.v1",
        Arc::new(IdempotentHandler::new(
            ForwardingHandler(handler.clone()),
            Arc::new(InMemoryProcessedEventStore::new()),
        )),
    );

    struct ForwardingHandler(Arc<FlakyThenCounting>);

    #[async_trait]
    impl EventHandler for ForwardingHandler {
        async fn handle(&self, envelope: EventEnvelope) -> Result<(), DomainError> {
            self.0.handle(envelope).await
        }

        fn name(&self) -> &'static str {
            "ForwardingHandler"
        }
    }

    let worker = QueueWorker::new(
        Arc::new(h.store.as_ref().clone()),
        None,
        router,
        h.metrics.clone(),
        QueueWorkerConfig {
            worker_id: "s6-worker".to_string(),
            max_tries: 8,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(4),
            ..Default::default()
        },
    );

    // Produce exactly one outbox row.
    h.register_as("ua", &event).await;
    assert_eq!(h.store.outbox_len().await, 1);

    // Three failing cycles; each scheduled retry is forced due.
    for attempt in 1..=3 {
        worker.poll_once().await.unwrap();
        let row = h.store.outbox_rows().await.remove(0);
        assert_eq!(row.status, OutboxStatus::Failed);
        assert_eq!(row.try_count, attempt);
        h.store.force_retries_due().await;
    }

    // Fourth delivery succeeds.
    worker.poll_once().await.unwrap();

    let row = h.store.outbox_rows().await.remove(0);
    assert_eq!(row.status, OutboxStatus::Processed);
    assert_eq!(row.try_count, 4);
    assert_eq!(handler.successes.load(Ordering::SeqCst), 1);

    // Redelivery after success is deduplicated: no second logical delivery.
    h.store
        .mark_failed(row.id, "redelivered", Timestamp::now().minus_secs(1))
        .await
        .unwrap();
    worker.poll_once().await.unwrap();
    assert_eq!(handler.successes.load(Ordering::SeqCst), 1);
}

/// Round trip: register → cancel → register again yields a fresh row and a
/// contiguous waitlist.
#[tokio::test]
async fn register_cancel_register_keeps_waitlist_contiguous() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    h.seed_user("ua").await;
    h.seed_user("ub").await;
    h.seed_user("uc").await;

    h.register_as("ua", &event).await;
    let b = h.register_as("ub", &event).await;
    h.register_as("uc", &event).await;

    h.cancel_as_admin(&b).await;
    let b_again = h.register_as("ub", &event).await;
    assert_ne!(b_again.id(), b.id());

    let mut positions: Vec<i32> = h
        .rows(&event)
        .await
        .into_iter()
        .filter(|r| r.status() == RegistrationStatus::Waitlisted)
        .filter_map(|r| r.position_in_queue())
        .collect();
    positions.sort_unstable();
    assert_eq!(positions, vec![1, 2]);
}

/// Position-change notifications go out on the per-event topic in order.
#[tokio::test]
async fn queue_moves_notify_subscribers_in_order() {
    let h = Harness::new();
    let event = h.seed_event(1).await;
    for subject in ["ua", "ub", "uc", "ud"] {
        h.seed_user(subject).await;
    }

    let a = h.register_as("ua", &event).await;
    h.register_as("ub", &event).await;
    h.register_as("uc", &event).await;
    h.register_as("ud", &event).await;

    // Cancel the confirmed row: ub promoted, uc 2→1, ud 3→2.
    h.cancel_as_admin(&a).await;

    let topic = gatherly::ports::topic_for(event.id());
    let published = h.notifications.for_topic(&topic);
    assert_eq!(published.len(), 2);
    assert!(published
        .iter()
        .all(|n| n.action == gatherly::ports::RegistrationAction::PositionChanged));
}
