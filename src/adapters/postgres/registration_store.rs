//! PostgreSQL implementation of RegistrationStore.
//!
//! Every operation is a single transaction that takes the event's advisory
//! lock (`pg_advisory_xact_lock`, transaction-scoped, keyed by the first 8
//! bytes of the event UUID), loads the state the pure planners need, applies
//! the plan, and writes the outbox rows for the queued events before
//! committing. Concurrent commands on the same event serialize on the lock;
//! different events never contend.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::foundation::{
    DomainError, ErrorCode, EventMetadata, LiveEventId, RegistrationId, Timestamp, UserId,
};
use crate::domain::live_event::LiveEvent;
use crate::domain::registration::waitlist::{
    plan_admission, plan_confirm, plan_promotion, plan_reindex, Admission, WaitlistEntry,
};
use crate::domain::registration::{emission, Registration, RegistrationStatus};
use crate::ports::{
    AdmissionOutcome, CancellationOutcome, EmittedEvents, PromotionOutcome, RegistrationStore,
};

use super::outbox_store::insert_outbox_rows;
use super::registration_reader::row_to_registration;

fn db(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(context, e)
}

/// PostgreSQL registration store.
#[derive(Clone)]
pub struct PostgresRegistrationStore {
    pool: PgPool,
}

impl PostgresRegistrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Acquire the event's transaction-scoped advisory lock.
    async fn lock_event(
        txn: &mut Transaction<'_, Postgres>,
        live_event_id: &LiveEventId,
    ) -> Result<(), DomainError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(live_event_id.advisory_lock_key())
            .execute(&mut **txn)
            .await
            .map_err(db("Failed to take event advisory lock"))?;
        Ok(())
    }

    async fn confirmed_count(
        txn: &mut Transaction<'_, Postgres>,
        live_event_id: &LiveEventId,
    ) -> Result<i64, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status = $2",
        )
        .bind(live_event_id.as_uuid())
        .bind(RegistrationStatus::Confirmed.as_i16())
        .fetch_one(&mut **txn)
        .await
        .map_err(db("Failed to count confirmed registrations"))?;
        Ok(count)
    }

    /// Next waitlist position input: `max(position_in_queue)` over the
    /// event's waitlisted rows. Only meaningful under the advisory lock.
    async fn max_waitlist_position(
        txn: &mut Transaction<'_, Postgres>,
        live_event_id: &LiveEventId,
    ) -> Result<Option<i32>, DomainError> {
        let (max,): (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(position_in_queue) FROM event_registrations \
             WHERE event_id = $1 AND status = $2",
        )
        .bind(live_event_id.as_uuid())
        .bind(RegistrationStatus::Waitlisted.as_i16())
        .fetch_one(&mut **txn)
        .await
        .map_err(db("Failed to read max waitlist position"))?;
        Ok(max)
    }

    async fn waitlist_entries(
        txn: &mut Transaction<'_, Postgres>,
        live_event_id: &LiveEventId,
    ) -> Result<Vec<WaitlistEntry>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, user_id, position_in_queue, registration_date \
             FROM event_registrations \
             WHERE event_id = $1 AND status = $2 \
             ORDER BY position_in_queue ASC, registration_date ASC, id ASC",
        )
        .bind(live_event_id.as_uuid())
        .bind(RegistrationStatus::Waitlisted.as_i16())
        .fetch_all(&mut **txn)
        .await
        .map_err(db("Failed to load waitlist"))?;

        rows.into_iter()
            .map(|row| {
                let id: uuid::Uuid = row
                    .try_get("id")
                    .map_err(db("Failed to get waitlist row id"))?;
                let user_id: uuid::Uuid = row
                    .try_get("user_id")
                    .map_err(db("Failed to get waitlist row user"))?;
                let position: i32 = row
                    .try_get("position_in_queue")
                    .map_err(db("Failed to get waitlist row position"))?;
                let registered_at: chrono::DateTime<chrono::Utc> = row
                    .try_get("registration_date")
                    .map_err(db("Failed to get waitlist row date"))?;
                Ok(WaitlistEntry {
                    registration_id: RegistrationId::from_uuid(id),
                    user_id: UserId::from_uuid(user_id),
                    position,
                    registered_at: Timestamp::from_datetime(registered_at),
                })
            })
            .collect()
    }

    /// Load a row with its row lock. Callers must already hold the event's
    /// advisory lock; taking row locks first would invert the lock order
    /// against the promotion path and invite deadlocks.
    async fn load_registration(
        txn: &mut Transaction<'_, Postgres>,
        registration_id: &RegistrationId,
    ) -> Result<Option<Registration>, DomainError> {
        let row = sqlx::query(
            "SELECT id, event_id, user_id, registration_date, status, \
                    position_in_queue, notes, updated_at \
             FROM event_registrations WHERE id = $1 FOR UPDATE",
        )
        .bind(registration_id.as_uuid())
        .fetch_optional(&mut **txn)
        .await
        .map_err(db("Failed to load registration"))?;

        row.map(row_to_registration).transpose()
    }

    /// Lock-free peek used to learn the row's event before taking the
    /// advisory lock. The row is re-read under `FOR UPDATE` afterwards.
    async fn peek_registration(
        txn: &mut Transaction<'_, Postgres>,
        registration_id: &RegistrationId,
    ) -> Result<Option<Registration>, DomainError> {
        let row = sqlx::query(
            "SELECT id, event_id, user_id, registration_date, status, \
                    position_in_queue, notes, updated_at \
             FROM event_registrations WHERE id = $1",
        )
        .bind(registration_id.as_uuid())
        .fetch_optional(&mut **txn)
        .await
        .map_err(db("Failed to load registration"))?;

        row.map(row_to_registration).transpose()
    }

    async fn insert_registration(
        txn: &mut Transaction<'_, Postgres>,
        registration: &Registration,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO event_registrations \
             (id, event_id, user_id, registration_date, status, position_in_queue, notes, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(registration.id().as_uuid())
        .bind(registration.live_event_id().as_uuid())
        .bind(registration.user_id().as_uuid())
        .bind(registration.registered_at().as_datetime())
        .bind(registration.status().as_i16())
        .bind(registration.position_in_queue())
        .bind(registration.notes())
        .bind(registration.updated_at().as_datetime())
        .execute(&mut **txn)
        .await
        .map_err(db("Failed to insert registration"))?;
        Ok(())
    }

    async fn update_registration(
        txn: &mut Transaction<'_, Postgres>,
        registration: &Registration,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE event_registrations \
             SET status = $2, position_in_queue = $3, updated_at = $4 \
             WHERE id = $1",
        )
        .bind(registration.id().as_uuid())
        .bind(registration.status().as_i16())
        .bind(registration.position_in_queue())
        .bind(registration.updated_at().as_datetime())
        .execute(&mut **txn)
        .await
        .map_err(db("Failed to update registration"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::registration_not_found(registration.id()));
        }
        Ok(())
    }

    /// Promote and reposition per plan; shared by promote/confirm/reindex.
    async fn apply_promotion_plan(
        txn: &mut Transaction<'_, Postgres>,
        live_event_id: LiveEventId,
        plan: crate::domain::registration::waitlist::PromotionPlan,
        metadata: &EventMetadata,
    ) -> Result<PromotionOutcome, DomainError> {
        let now = Timestamp::now();
        let mut outcome = PromotionOutcome::default();

        for entry in &plan.promoted {
            let mut registration = Self::load_registration(txn, &entry.registration_id)
                .await?
                .ok_or_else(|| DomainError::registration_not_found(entry.registration_id))?;
            registration.promote()?;
            Self::update_registration(txn, &registration).await?;
            outcome
                .events
                .queued
                .push(emission::promoted_envelope(live_event_id, entry, now, metadata));
            outcome.promoted.push(registration);
        }

        for change in &plan.repositioned {
            let mut registration = Self::load_registration(txn, &change.registration_id)
                .await?
                .ok_or_else(|| DomainError::registration_not_found(change.registration_id))?;
            registration.reposition(change.new_position)?;
            Self::update_registration(txn, &registration).await?;
            outcome.events.synchronous.push(emission::position_changed_envelope(
                live_event_id,
                change,
                now,
                metadata,
            ));
        }

        insert_outbox_rows(txn, &outcome.events.queued).await?;
        Ok(outcome)
    }
}

#[async_trait]
impl RegistrationStore for PostgresRegistrationStore {
    async fn admit(
        &self,
        event: &LiveEvent,
        user_id: UserId,
        notes: Option<String>,
        metadata: EventMetadata,
    ) -> Result<AdmissionOutcome, DomainError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(db("Failed to begin admission transaction"))?;

        Self::lock_event(&mut txn, event.id()).await?;

        // Uniqueness: one active registration per (event, user).
        let (duplicates,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations \
             WHERE event_id = $1 AND user_id = $2 AND status <> $3",
        )
        .bind(event.id().as_uuid())
        .bind(user_id.as_uuid())
        .bind(RegistrationStatus::Cancelled.as_i16())
        .fetch_one(&mut *txn)
        .await
        .map_err(db("Failed to check for duplicate registration"))?;
        if duplicates > 0 {
            return Err(DomainError::new(
                ErrorCode::DuplicateRegistration,
                format!("User {} is already registered for event {}", user_id, event.id()),
            ));
        }

        let confirmed = Self::confirmed_count(&mut txn, event.id()).await?;
        let max_position = Self::max_waitlist_position(&mut txn, event.id()).await?;

        let registration = match plan_admission(event.capacity(), confirmed, max_position) {
            Admission::Confirmed => {
                Registration::confirmed(RegistrationId::new(), *event.id(), user_id, notes)
            }
            Admission::Waitlisted { position } => {
                if !event.is_waitlist_open() {
                    return Err(DomainError::new(
                        ErrorCode::WaitlistClosed,
                        format!("Event {} is full and its waitlist is closed", event.id()),
                    ));
                }
                Registration::waitlisted(
                    RegistrationId::new(),
                    *event.id(),
                    user_id,
                    position,
                    notes,
                )
            }
        };

        Self::insert_registration(&mut txn, &registration).await?;

        let events = EmittedEvents {
            synchronous: Vec::new(),
            queued: emission::admission_envelopes(&registration, &metadata),
        };
        insert_outbox_rows(&mut txn, &events.queued).await?;

        txn.commit()
            .await
            .map_err(db("Failed to commit admission"))?;

        Ok(AdmissionOutcome {
            registration,
            events,
        })
    }

    async fn cancel(
        &self,
        registration_id: RegistrationId,
        metadata: EventMetadata,
    ) -> Result<CancellationOutcome, DomainError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(db("Failed to begin cancellation transaction"))?;

        // Cancellation changes the confirmed count the admission path reads,
        // so it serializes on the same lock. Peek first to learn the event,
        // lock, then re-read the authoritative row state.
        let peeked = Self::peek_registration(&mut txn, &registration_id)
            .await?
            .ok_or_else(|| DomainError::registration_not_found(registration_id))?;
        Self::lock_event(&mut txn, peeked.live_event_id()).await?;

        let mut registration = Self::load_registration(&mut txn, &registration_id)
            .await?
            .ok_or_else(|| DomainError::registration_not_found(registration_id))?;

        let previous_status = registration.status();
        let freed_position = registration.cancel()?;
        Self::update_registration(&mut txn, &registration).await?;

        txn.commit()
            .await
            .map_err(db("Failed to commit cancellation"))?;

        let events = EmittedEvents {
            synchronous: emission::cancellation_envelopes(
                &registration,
                previous_status,
                freed_position,
                &metadata,
            ),
            queued: Vec::new(),
        };

        Ok(CancellationOutcome {
            registration,
            events,
        })
    }

    async fn promote(
        &self,
        live_event_id: LiveEventId,
        metadata: EventMetadata,
    ) -> Result<PromotionOutcome, DomainError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(db("Failed to begin promotion transaction"))?;

        Self::lock_event(&mut txn, &live_event_id).await?;

        let (capacity,): (i32,) = sqlx::query_as("SELECT capacity FROM events WHERE id = $1")
            .bind(live_event_id.as_uuid())
            .fetch_optional(&mut *txn)
            .await
            .map_err(db("Failed to load event capacity"))?
            .ok_or_else(|| DomainError::event_not_found(live_event_id))?;

        let confirmed = Self::confirmed_count(&mut txn, &live_event_id).await?;
        let waitlisted = Self::waitlist_entries(&mut txn, &live_event_id).await?;

        let plan = plan_promotion(capacity, confirmed, waitlisted);
        let outcome =
            Self::apply_promotion_plan(&mut txn, live_event_id, plan, &metadata).await?;

        txn.commit()
            .await
            .map_err(db("Failed to commit promotion"))?;
        Ok(outcome)
    }

    async fn confirm(
        &self,
        registration_id: RegistrationId,
        metadata: EventMetadata,
    ) -> Result<PromotionOutcome, DomainError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(db("Failed to begin confirm transaction"))?;

        let peeked = Self::peek_registration(&mut txn, &registration_id)
            .await?
            .ok_or_else(|| DomainError::registration_not_found(registration_id))?;
        let live_event_id = *peeked.live_event_id();
        Self::lock_event(&mut txn, &live_event_id).await?;

        let registration = Self::load_registration(&mut txn, &registration_id)
            .await?
            .ok_or_else(|| DomainError::registration_not_found(registration_id))?;

        if !registration.status().is_promotable() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot confirm a {} registration", registration.status()),
            ));
        }

        let outcome = if registration.status() == RegistrationStatus::Waitlisted {
            let waitlisted = Self::waitlist_entries(&mut txn, &live_event_id).await?;
            let plan = plan_confirm(registration_id, waitlisted).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::InternalError,
                    "Waitlisted row missing from its own queue",
                )
            })?;
            Self::apply_promotion_plan(&mut txn, live_event_id, plan, &metadata).await?
        } else {
            let mut registration = registration;
            registration.promote()?;
            Self::update_registration(&mut txn, &registration).await?;

            let mut outcome = PromotionOutcome::default();
            outcome
                .events
                .queued
                .push(emission::confirmed_envelope(&registration, None, &metadata));
            insert_outbox_rows(&mut txn, &outcome.events.queued).await?;
            outcome.promoted.push(registration);
            outcome
        };

        txn.commit()
            .await
            .map_err(db("Failed to commit confirm"))?;
        Ok(outcome)
    }

    async fn reindex(
        &self,
        live_event_id: LiveEventId,
        metadata: EventMetadata,
    ) -> Result<PromotionOutcome, DomainError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(db("Failed to begin reindex transaction"))?;

        Self::lock_event(&mut txn, &live_event_id).await?;

        let waitlisted = Self::waitlist_entries(&mut txn, &live_event_id).await?;
        let changes = plan_reindex(waitlisted);

        let now = Timestamp::now();
        let mut outcome = PromotionOutcome::default();
        for change in &changes {
            let mut registration = Self::load_registration(&mut txn, &change.registration_id)
                .await?
                .ok_or_else(|| DomainError::registration_not_found(change.registration_id))?;
            registration.reposition(change.new_position)?;
            Self::update_registration(&mut txn, &registration).await?;
            outcome.events.synchronous.push(emission::position_changed_envelope(
                live_event_id,
                change,
                now,
                &metadata,
            ));
        }

        txn.commit()
            .await
            .map_err(db("Failed to commit reindex"))?;
        Ok(outcome)
    }

    async fn find_registration(
        &self,
        registration_id: &RegistrationId,
    ) -> Result<Option<Registration>, DomainError> {
        let row = sqlx::query(
            "SELECT id, event_id, user_id, registration_date, status, \
                    position_in_queue, notes, updated_at \
             FROM event_registrations WHERE id = $1",
        )
        .bind(registration_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db("Failed to fetch registration"))?;

        row.map(row_to_registration).transpose()
    }
}
