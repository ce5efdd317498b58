//! CancelRegistrationHandler - cancels a registration and drives the
//! synchronous promotion pipeline.

use std::sync::Arc;

use crate::application::{EventDispatcher, Metrics};
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, EventMetadata, RegistrationId,
};
use crate::domain::registration::Registration;
use crate::ports::{RegistrationStore, UserRepository};

/// Command to cancel one registration.
#[derive(Debug, Clone)]
pub struct CancelRegistrationCommand {
    pub registration_id: RegistrationId,
}

/// Handler for cancellation. Owner or admin only.
///
/// Promotion is not performed inline: the store emits
/// `registration.cancelled.v1`, and the dispatcher runs the promotion and
/// reindex handlers synchronously before this handler returns.
pub struct CancelRegistrationHandler {
    store: Arc<dyn RegistrationStore>,
    users: Arc<dyn UserRepository>,
    dispatcher: Arc<EventDispatcher>,
    metrics: Arc<Metrics>,
}

impl CancelRegistrationHandler {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        users: Arc<dyn UserRepository>,
        dispatcher: Arc<EventDispatcher>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            users,
            dispatcher,
            metrics,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelRegistrationCommand,
        metadata: CommandMetadata,
    ) -> Result<Registration, DomainError> {
        // 1. Load and authorize.
        let registration = self
            .store
            .find_registration(&cmd.registration_id)
            .await?
            .ok_or_else(|| DomainError::registration_not_found(cmd.registration_id))?;

        if !metadata.requester.is_admin {
            let requester_user = self
                .users
                .find_by_identity(&metadata.requester.subject)
                .await?
                .ok_or_else(|| {
                    DomainError::new(ErrorCode::Forbidden, "Caller has no user profile")
                })?;
            if !registration.is_owned_by(requester_user.id()) {
                return Err(DomainError::new(
                    ErrorCode::Forbidden,
                    "Only the registrant or an admin may cancel a registration",
                ));
            }
        }

        // 2. Cancel transaction.
        let event_metadata = EventMetadata {
            correlation_id: Some(metadata.correlation_id()),
            causation_id: None,
            user_id: Some(metadata.requester.subject.clone()),
        };
        let outcome = self.store.cancel(cmd.registration_id, event_metadata).await?;

        // 3. Synchronous pipeline: promotion fills the freed seat, reindex
        //    compacts the queue, position notifications go out in order.
        self.dispatcher.dispatch(outcome.events).await?;

        self.metrics.incr_cancellations();
        Ok(outcome.registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{Requester, Timestamp, UserId};
    use crate::domain::live_event::{EventLimits, LiveEvent};
    use crate::domain::registration::RegistrationStatus;
    use crate::domain::user::User;
    use crate::ports::{LiveEventRepository, RegistrationStore as _, UserRepository as _};

    async fn seeded() -> (Arc<InMemoryStore>, LiveEvent, User) {
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
            1,
            "org-1".to_string(),
            &EventLimits::default(),
        )
        .unwrap();
        event.publish();
        LiveEventRepository::save(store.as_ref(), &event)
            .await
            .unwrap();

        let user = User::new(
            UserId::new(),
            "subject-123".to_string(),
            "ada@example.com".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            None,
        )
        .unwrap();
        UserRepository::save(store.as_ref(), &user).await.unwrap();

        (store, event, user)
    }

    fn handler(store: &Arc<InMemoryStore>, dispatcher: Arc<EventDispatcher>) -> CancelRegistrationHandler {
        CancelRegistrationHandler::new(
            store.clone(),
            store.clone(),
            dispatcher,
            Arc::new(Metrics::new()),
        )
    }

    #[tokio::test]
    async fn owner_can_cancel() {
        let (store, event, user) = seeded().await;
        let admitted = store
            .admit(&event, *user.id(), None, Default::default())
            .await
            .unwrap();

        let h = handler(&store, Arc::new(EventDispatcher::new()));
        let cancelled = h
            .handle(
                CancelRegistrationCommand {
                    registration_id: *admitted.registration.id(),
                },
                CommandMetadata::test_user(),
            )
            .await
            .unwrap();

        assert_eq!(cancelled.status(), RegistrationStatus::Cancelled);
    }

    #[tokio::test]
    async fn stranger_is_forbidden() {
        let (store, event, user) = seeded().await;
        let admitted = store
            .admit(&event, *user.id(), None, Default::default())
            .await
            .unwrap();

        let stranger = User::new(
            UserId::new(),
            "stranger".to_string(),
            "x@example.com".to_string(),
            String::from("X"),
            String::from("Y"),
            None,
        )
        .unwrap();
        UserRepository::save(store.as_ref(), &stranger)
            .await
            .unwrap();

        let h = handler(&store, Arc::new(EventDispatcher::new()));
        let err = h
            .handle(
                CancelRegistrationCommand {
                    registration_id: *admitted.registration.id(),
                },
                CommandMetadata::new(Requester::user("stranger")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn admin_can_cancel_anyone() {
        let (store, event, user) = seeded().await;
        let admitted = store
            .admit(&event, *user.id(), None, Default::default())
            .await
            .unwrap();

        let h = handler(&store, Arc::new(EventDispatcher::new()));
        h.handle(
            CancelRegistrationCommand {
                registration_id: *admitted.registration.id(),
            },
            CommandMetadata::test_admin(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn missing_registration_is_not_found() {
        let (store, _, _) = seeded().await;
        let h = handler(&store, Arc::new(EventDispatcher::new()));
        let err = h
            .handle(
                CancelRegistrationCommand {
                    registration_id: RegistrationId::new(),
                },
                CommandMetadata::test_admin(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RegistrationNotFound);
    }
}
