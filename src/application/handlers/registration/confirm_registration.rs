//! ConfirmRegistrationHandler - admin promotion of a specific row.

use std::sync::Arc;

use crate::application::{EventDispatcher, Metrics};
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, EventMetadata, RegistrationId,
};
use crate::domain::registration::Registration;
use crate::ports::RegistrationStore;

/// Command to confirm one Pending/Waitlisted registration.
#[derive(Debug, Clone)]
pub struct ConfirmRegistrationCommand {
    pub registration_id: RegistrationId,
}

/// Handler for admin-initiated confirmation, bypassing queue order.
pub struct ConfirmRegistrationHandler {
    store: Arc<dyn RegistrationStore>,
    dispatcher: Arc<EventDispatcher>,
    metrics: Arc<Metrics>,
}

impl ConfirmRegistrationHandler {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        dispatcher: Arc<EventDispatcher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            metrics,
        }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmRegistrationCommand,
        metadata: CommandMetadata,
    ) -> Result<Registration, DomainError> {
        if !metadata.requester.is_admin {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins may confirm registrations",
            ));
        }

        let event_metadata = EventMetadata {
            correlation_id: Some(metadata.correlation_id()),
            causation_id: None,
            user_id: Some(metadata.requester.subject.clone()),
        };
        let outcome = self.store.confirm(cmd.registration_id, event_metadata).await?;

        let confirmed = outcome
            .promoted
            .first()
            .cloned()
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InternalError, "Confirm promoted no rows")
            })?;

        self.metrics.incr_promotions(outcome.promoted.len() as u64);
        // Queue compaction may have moved rows; notify in order.
        self.dispatcher.dispatch(outcome.events).await?;

        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::live_event::{EventLimits, LiveEvent};
    use crate::domain::registration::RegistrationStatus;
    use crate::ports::{LiveEventRepository as _, RegistrationStore as _};

    async fn seeded(capacity: i32) -> (Arc<InMemoryStore>, LiveEvent) {
        let store = Arc::new(InMemoryStore::new());
        let start = Timestamp::now().plus_hours(24);
        let mut event = LiveEvent::new(
            crate::domain::foundation::LiveEventId::new(),
            "Talk".to_string(),
            String::new(),
            start,
            start.plus_hours(1),
            "UTC".to_string(),
            String::new(),
            capacity,
            "org-1".to_string(),
            &EventLimits::default(),
        )
        .unwrap();
        event.publish();
        store.save(&event).await.unwrap();
        (store, event)
    }

    fn handler(store: &Arc<InMemoryStore>) -> ConfirmRegistrationHandler {
        ConfirmRegistrationHandler::new(
            store.clone(),
            Arc::new(EventDispatcher::new()),
            Arc::new(Metrics::new()),
        )
    }

    #[tokio::test]
    async fn admin_confirms_waitlisted_row() {
        let (store, event) = seeded(1).await;
        store
            .admit(&event, UserId::new(), None, Default::default())
            .await
            .unwrap();
        let waitlisted = store
            .admit(&event, UserId::new(), None, Default::default())
            .await
            .unwrap();

        let confirmed = handler(&store)
            .handle(
                ConfirmRegistrationCommand {
                    registration_id: *waitlisted.registration.id(),
                },
                CommandMetadata::test_admin(),
            )
            .await
            .unwrap();

        assert_eq!(confirmed.status(), RegistrationStatus::Confirmed);
        assert!(confirmed.position_in_queue().is_none());
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let (store, event) = seeded(1).await;
        let admitted = store
            .admit(&event, UserId::new(), None, Default::default())
            .await
            .unwrap();

        let err = handler(&store)
            .handle(
                ConfirmRegistrationCommand {
                    registration_id: *admitted.registration.id(),
                },
                CommandMetadata::test_user(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn confirming_cancelled_row_conflicts() {
        let (store, event) = seeded(1).await;
        let admitted = store
            .admit(&event, UserId::new(), None, Default::default())
            .await
            .unwrap();
        store
            .cancel(*admitted.registration.id(), Default::default())
            .await
            .unwrap();

        let err = handler(&store)
            .handle(
                ConfirmRegistrationCommand {
                    registration_id: *admitted.registration.id(),
                },
                CommandMetadata::test_admin(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }
}
