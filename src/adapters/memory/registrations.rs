//! In-memory RegistrationStore and RegistrationReader.
//!
//! Mirrors the postgres backend operation for operation: same planners, same
//! emitted events, same outbox rows. The single state mutex stands in for
//! the transaction + advisory lock.

use async_trait::async_trait;

use crate::domain::foundation::{
    DomainError, ErrorCode, EventMetadata, LiveEventId, RegistrationId, Timestamp, UserId,
};
use crate::domain::live_event::LiveEvent;
use crate::domain::registration::waitlist::{plan_confirm, plan_promotion, plan_reindex};
use crate::domain::registration::{emission, Registration, RegistrationStatus};
use crate::ports::{
    AdmissionOutcome, CancellationOutcome, EmittedEvents, OutboxMessage, Page,
    PromotionOutcome, RegistrationPage, RegistrationReader, RegistrationStore, WaitlistRow,
};

use super::state::{InMemoryStore, StoreState};

impl InMemoryStore {
    fn push_outbox(state: &mut StoreState, events: &EmittedEvents) {
        for envelope in &events.queued {
            state.outbox.push(OutboxMessage::pending(envelope.clone()));
        }
    }

    /// Shared promotion pass used by `promote` and capacity increases.
    fn run_promotion(
        state: &mut StoreState,
        live_event_id: LiveEventId,
        metadata: &EventMetadata,
    ) -> Result<PromotionOutcome, DomainError> {
        let event = state
            .events
            .get(&live_event_id)
            .ok_or_else(|| DomainError::event_not_found(live_event_id))?;
        let capacity = event.capacity();
        let confirmed = state.confirmed_count(&live_event_id);
        let plan = plan_promotion(capacity, confirmed, state.waitlist_entries(&live_event_id));

        let now = Timestamp::now();
        let mut outcome = PromotionOutcome::default();

        for entry in &plan.promoted {
            let registration = state
                .registrations
                .get_mut(&entry.registration_id)
                .ok_or_else(|| DomainError::registration_not_found(entry.registration_id))?;
            registration.promote()?;
            outcome.promoted.push(registration.clone());
            outcome
                .events
                .queued
                .push(emission::promoted_envelope(live_event_id, entry, now, metadata));
        }

        for change in &plan.repositioned {
            let registration = state
                .registrations
                .get_mut(&change.registration_id)
                .ok_or_else(|| DomainError::registration_not_found(change.registration_id))?;
            registration.reposition(change.new_position)?;
            outcome.events.synchronous.push(emission::position_changed_envelope(
                live_event_id,
                change,
                now,
                metadata,
            ));
        }

        Self::push_outbox(state, &outcome.events);
        Ok(outcome)
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn admit(
        &self,
        event: &LiveEvent,
        user_id: UserId,
        notes: Option<String>,
        metadata: EventMetadata,
    ) -> Result<AdmissionOutcome, DomainError> {
        use crate::domain::registration::waitlist::{plan_admission, Admission};

        let mut state = self.inner.lock().await;

        if state.active_registration(event.id(), &user_id).is_some() {
            return Err(DomainError::new(
                ErrorCode::DuplicateRegistration,
                format!("User {} is already registered for event {}", user_id, event.id()),
            ));
        }

        let confirmed = state.confirmed_count(event.id());
        let max_position = state.max_waitlist_position(event.id());

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

        let events = EmittedEvents {
            synchronous: Vec::new(),
            queued: emission::admission_envelopes(&registration, &metadata),
        };
        Self::push_outbox(&mut state, &events);
        state
            .registrations
            .insert(*registration.id(), registration.clone());

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
        let mut state = self.inner.lock().await;

        let registration = state
            .registrations
            .get_mut(&registration_id)
            .ok_or_else(|| DomainError::registration_not_found(registration_id))?;

        let previous_status = registration.status();
        let freed_position = registration.cancel()?;
        let registration = registration.clone();

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
        let mut state = self.inner.lock().await;
        Self::run_promotion(&mut state, live_event_id, &metadata)
    }

    async fn confirm(
        &self,
        registration_id: RegistrationId,
        metadata: EventMetadata,
    ) -> Result<PromotionOutcome, DomainError> {
        let mut state = self.inner.lock().await;

        let registration = state
            .registrations
            .get(&registration_id)
            .ok_or_else(|| DomainError::registration_not_found(registration_id))?;

        if !registration.status().is_promotable() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot confirm a {} registration", registration.status()),
            ));
        }

        let live_event_id = *registration.live_event_id();
        let now = Timestamp::now();
        let mut outcome = PromotionOutcome::default();

        if registration.status() == RegistrationStatus::Waitlisted {
            let entries = state.waitlist_entries(&live_event_id);
            let plan = plan_confirm(registration_id, entries).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::InternalError,
                    "Waitlisted row missing from its own queue",
                )
            })?;

            for entry in &plan.promoted {
                let row = state
                    .registrations
                    .get_mut(&entry.registration_id)
                    .ok_or_else(|| DomainError::registration_not_found(entry.registration_id))?;
                row.promote()?;
                outcome.promoted.push(row.clone());
                outcome
                    .events
                    .queued
                    .push(emission::promoted_envelope(live_event_id, entry, now, &metadata));
            }

            for change in &plan.repositioned {
                let row = state
                    .registrations
                    .get_mut(&change.registration_id)
                    .ok_or_else(|| DomainError::registration_not_found(change.registration_id))?;
                row.reposition(change.new_position)?;
                outcome.events.synchronous.push(emission::position_changed_envelope(
                    live_event_id,
                    change,
                    now,
                    &metadata,
                ));
            }
        } else {
            let row = state
                .registrations
                .get_mut(&registration_id)
                .ok_or_else(|| DomainError::registration_not_found(registration_id))?;
            row.promote()?;
            let row = row.clone();
            outcome
                .events
                .queued
                .push(emission::confirmed_envelope(&row, None, &metadata));
            outcome.promoted.push(row);
        }

        Self::push_outbox(&mut state, &outcome.events);
        Ok(outcome)
    }

    async fn reindex(
        &self,
        live_event_id: LiveEventId,
        metadata: EventMetadata,
    ) -> Result<PromotionOutcome, DomainError> {
        let mut state = self.inner.lock().await;

        let changes = plan_reindex(state.waitlist_entries(&live_event_id));
        let now = Timestamp::now();
        let mut outcome = PromotionOutcome::default();

        for change in &changes {
            let row = state
                .registrations
                .get_mut(&change.registration_id)
                .ok_or_else(|| DomainError::registration_not_found(change.registration_id))?;
            row.reposition(change.new_position)?;
            outcome.events.synchronous.push(emission::position_changed_envelope(
                live_event_id,
                change,
                now,
                &metadata,
            ));
        }

        Ok(outcome)
    }

    async fn find_registration(
        &self,
        registration_id: &RegistrationId,
    ) -> Result<Option<Registration>, DomainError> {
        Ok(self
            .inner
            .lock()
            .await
            .registrations
            .get(registration_id)
            .cloned())
    }
}

#[async_trait]
impl RegistrationReader for InMemoryStore {
    async fn list_for_event(
        &self,
        live_event_id: &LiveEventId,
        status: Option<RegistrationStatus>,
        page: Page,
    ) -> Result<RegistrationPage, DomainError> {
        let state = self.inner.lock().await;

        let mut rows: Vec<Registration> = state
            .registrations
            .values()
            .filter(|r| r.live_event_id() == live_event_id)
            .filter(|r| status.map_or(true, |s| r.status() == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.registered_at()
                .cmp(b.registered_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        let total = rows.len() as i64;
        let items = rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();

        Ok(RegistrationPage { items, total })
    }

    async fn waitlist_for_event(
        &self,
        live_event_id: &LiveEventId,
    ) -> Result<Vec<WaitlistRow>, DomainError> {
        let state = self.inner.lock().await;

        let mut rows: Vec<WaitlistRow> = state
            .registrations
            .values()
            .filter(|r| {
                r.live_event_id() == live_event_id
                    && r.status() == RegistrationStatus::Waitlisted
            })
            .map(|r| WaitlistRow {
                registration_id: *r.id(),
                user_id: *r.user_id(),
                position: r.position_in_queue().unwrap_or(0),
                registered_at: *r.registered_at(),
            })
            .collect();
        rows.sort_by_key(|r| r.position);
        Ok(rows)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Registration>, DomainError> {
        let state = self.inner.lock().await;
        let mut rows: Vec<Registration> = state
            .registrations
            .values()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.registered_at().cmp(a.registered_at()));
        Ok(rows)
    }

    async fn count_for_event(&self, live_event_id: &LiveEventId) -> Result<i64, DomainError> {
        let state = self.inner.lock().await;
        Ok(state
            .registrations
            .values()
            .filter(|r| r.live_event_id() == live_event_id)
            .count() as i64)
    }

    async fn confirmed_count(&self, live_event_id: &LiveEventId) -> Result<i64, DomainError> {
        let state = self.inner.lock().await;
        Ok(state.confirmed_count(live_event_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::live_event::EventLimits;

    fn seeded_event(capacity: i32) -> LiveEvent {
        let start = Timestamp::now().plus_hours(24);
        let mut event = LiveEvent::new(
            LiveEventId::new(),
            "Test Event".to_string(),
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
        event
    }

    async fn store_with(event: &LiveEvent) -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .inner
            .lock()
            .await
            .events
            .insert(*event.id(), event.clone());
        store
    }

    #[tokio::test]
    async fn admit_confirms_until_capacity_then_waitlists() {
        let event = seeded_event(1);
        let store = store_with(&event).await;

        let first = store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();
        assert_eq!(first.registration.status(), RegistrationStatus::Confirmed);
        assert_eq!(first.events.queued.len(), 1);

        let second = store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();
        assert_eq!(second.registration.status(), RegistrationStatus::Waitlisted);
        assert_eq!(second.registration.position_in_queue(), Some(1));
        assert_eq!(second.events.queued.len(), 2);

        // One outbox row per queued envelope.
        assert_eq!(store.outbox_len().await, 3);
    }

    #[tokio::test]
    async fn admit_rejects_waitlist_entry_when_closed() {
        let mut event = seeded_event(1);
        event
            .update(
                crate::domain::live_event::EventPatch {
                    is_waitlist_open: Some(false),
                    ..Default::default()
                },
                &EventLimits::default(),
            )
            .unwrap();
        let store = store_with(&event).await;

        // Seat still free: admitted normally.
        store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();

        // Full and waitlist closed: rejected, no row, no outbox entry.
        let before = store.outbox_len().await;
        let err = store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WaitlistClosed);
        assert_eq!(store.outbox_len().await, before);
    }

    #[tokio::test]
    async fn admit_rejects_duplicate_active_registration() {
        let event = seeded_event(5);
        let store = store_with(&event).await;
        let user = UserId::new();

        store
            .admit(&event, user, None, EventMetadata::default())
            .await
            .unwrap();
        let err = store
            .admit(&event, user, None, EventMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateRegistration);
    }

    #[tokio::test]
    async fn cancel_then_readmit_is_allowed() {
        let event = seeded_event(5);
        let store = store_with(&event).await;
        let user = UserId::new();

        let first = store
            .admit(&event, user, None, EventMetadata::default())
            .await
            .unwrap();
        store
            .cancel(*first.registration.id(), EventMetadata::default())
            .await
            .unwrap();
        let again = store
            .admit(&event, user, None, EventMetadata::default())
            .await
            .unwrap();
        assert_ne!(again.registration.id(), first.registration.id());
    }

    #[tokio::test]
    async fn promote_fills_freed_seat_and_compacts() {
        let event = seeded_event(1);
        let store = store_with(&event).await;

        let a = store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();
        let b = store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();
        let c = store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();
        assert_eq!(b.registration.position_in_queue(), Some(1));
        assert_eq!(c.registration.position_in_queue(), Some(2));

        store
            .cancel(*a.registration.id(), EventMetadata::default())
            .await
            .unwrap();
        let outcome = store
            .promote(*event.id(), EventMetadata::default())
            .await
            .unwrap();

        assert_eq!(outcome.promoted.len(), 1);
        assert_eq!(outcome.promoted[0].id(), b.registration.id());
        // c moved from 2 to 1.
        assert_eq!(outcome.events.synchronous.len(), 1);

        let c_row = store
            .find_registration(c.registration.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(c_row.position_in_queue(), Some(1));
    }

    #[tokio::test]
    async fn confirm_waitlisted_row_out_of_order() {
        let event = seeded_event(1);
        let store = store_with(&event).await;

        store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();
        let b = store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();
        let c = store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();

        // Admin confirms c past b.
        let outcome = store
            .confirm(*c.registration.id(), EventMetadata::default())
            .await
            .unwrap();
        assert_eq!(outcome.promoted[0].id(), c.registration.id());

        let b_row = store
            .find_registration(b.registration.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(b_row.status(), RegistrationStatus::Waitlisted);
        assert_eq!(b_row.position_in_queue(), Some(1));
    }

    #[tokio::test]
    async fn waitlist_view_is_position_ordered() {
        let event = seeded_event(1);
        let store = store_with(&event).await;

        store
            .admit(&event, UserId::new(), None, EventMetadata::default())
            .await
            .unwrap();
        for _ in 0..3 {
            store
                .admit(&event, UserId::new(), None, EventMetadata::default())
                .await
                .unwrap();
        }

        let waitlist = store.waitlist_for_event(event.id()).await.unwrap();
        let positions: Vec<i32> = waitlist.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }
}
