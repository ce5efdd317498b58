//! RegisterHandler - command handler for event sign-up.

use std::sync::Arc;
use std::time::Duration;

use crate::application::Metrics;
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, EventMetadata, LiveEventId, RegistrationId,
};
use crate::domain::registration::{Registration, RegistrationStatus};
use crate::ports::{IdempotencyStore, LiveEventRepository, RegistrationStore, UserRepository};

/// Command to register the requester for an event.
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub live_event_id: LiveEventId,
    pub notes: Option<String>,
    /// Client-supplied nonce; requests with the same nonce are deduplicated
    /// within the idempotency TTL.
    pub idempotency_nonce: Option<String>,
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct RegisterResult {
    pub registration: Registration,
    /// True when this call replayed the outcome of an earlier identical
    /// request instead of creating a row.
    pub replayed: bool,
}

/// Handler for event sign-up with auto-waitlisting.
pub struct RegisterHandler {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn LiveEventRepository>,
    store: Arc<dyn RegistrationStore>,
    idempotency: Arc<dyn IdempotencyStore>,
    metrics: Arc<Metrics>,
    idempotency_ttl: Duration,
}

impl RegisterHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn LiveEventRepository>,
        store: Arc<dyn RegistrationStore>,
        idempotency: Arc<dyn IdempotencyStore>,
        metrics: Arc<Metrics>,
        idempotency_ttl: Duration,
    ) -> Self {
        Self {
            users,
            events,
            store,
            idempotency,
            metrics,
            idempotency_ttl,
        }
    }

    pub async fn handle(
        &self,
        cmd: RegisterCommand,
        metadata: CommandMetadata,
    ) -> Result<RegisterResult, DomainError> {
        // 1. Resolve the requester to a user row.
        let user = self
            .users
            .find_by_identity(&metadata.requester.subject)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UserNotFound,
                    "No user profile for the authenticated identity",
                )
            })?;

        // 2. Claim the idempotency key before any write.
        let idem_key = cmd.idempotency_nonce.as_deref().map(|nonce| {
            format!("register:{}:{}:{}", cmd.live_event_id, user.id(), nonce)
        });
        if let Some(key) = &idem_key {
            if !self.idempotency.try_claim(key, self.idempotency_ttl).await? {
                // Replay: return the first outcome when it is already known.
                if let Some(stored) = self.idempotency.recall(key).await? {
                    return self.replay(&stored).await;
                }
                // The first request is still in flight (or failed; claims
                // are only resolved on success). Reject rather than risk a
                // second row.
                return Err(DomainError::new(
                    ErrorCode::DuplicateRequest,
                    "A registration request with this key is already being processed",
                ));
            }
        }

        // 3. Preconditions: event exists, is published, has not started.
        let event = self
            .events
            .find_by_id(&cmd.live_event_id)
            .await?
            .ok_or_else(|| DomainError::event_not_found(cmd.live_event_id))?;
        event.ensure_accepts_registrations(&crate::domain::foundation::Timestamp::now())?;

        // 4. Admission transaction (advisory lock, outbox rows included).
        let event_metadata = EventMetadata {
            correlation_id: Some(metadata.correlation_id()),
            causation_id: None,
            user_id: Some(metadata.requester.subject.clone()),
        };
        let outcome = self
            .store
            .admit(&event, *user.id(), cmd.notes, event_metadata)
            .await?;

        // 5. Resolve the claim so replays can find the result.
        if let Some(key) = &idem_key {
            self.idempotency
                .remember(
                    key,
                    &outcome.registration.id().to_string(),
                    self.idempotency_ttl,
                )
                .await?;
        }

        self.metrics.incr_registrations();
        if outcome.registration.status() == RegistrationStatus::Waitlisted {
            self.metrics.incr_waitlisted();
        }

        Ok(RegisterResult {
            registration: outcome.registration,
            replayed: false,
        })
    }

    async fn replay(&self, stored_id: &str) -> Result<RegisterResult, DomainError> {
        let registration_id: RegistrationId = stored_id.parse().map_err(|_| {
            DomainError::new(
                ErrorCode::InternalError,
                "Stored idempotency result is not a registration id",
            )
        })?;
        let registration = self
            .store
            .find_registration(&registration_id)
            .await?
            .ok_or_else(|| DomainError::registration_not_found(registration_id))?;
        Ok(RegisterResult {
            registration,
            replayed: true,
        })
    }
}
