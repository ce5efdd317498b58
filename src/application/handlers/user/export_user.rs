//! ExportUserHandler - DSAR data export (self or admin).

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, LiveEventId, RegistrationId, Timestamp, UserId,
};
use crate::domain::registration::RegistrationStatus;
use crate::ports::{RegistrationReader, UserRepository};

/// Query for a user's full data export.
#[derive(Debug, Clone)]
pub struct ExportUserQuery {
    pub user_id: UserId,
}

/// Profile section of the export.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfileExport {
    pub id: UserId,
    pub identity_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// One registration row of the export.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationExport {
    pub id: RegistrationId,
    pub event_id: LiveEventId,
    pub status: RegistrationStatus,
    pub position_in_queue: Option<i32>,
    pub registered_at: Timestamp,
    pub notes: Option<String>,
}

/// The DSAR JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct UserExport {
    pub user: UserProfileExport,
    pub registrations: Vec<RegistrationExport>,
    pub exported_at: Timestamp,
}

/// Handler assembling the export.
pub struct ExportUserHandler {
    users: Arc<dyn UserRepository>,
    registrations: Arc<dyn RegistrationReader>,
}

impl ExportUserHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        registrations: Arc<dyn RegistrationReader>,
    ) -> Self {
        Self {
            users,
            registrations,
        }
    }

    pub async fn handle(
        &self,
        query: ExportUserQuery,
        metadata: CommandMetadata,
    ) -> Result<UserExport, DomainError> {
        let user = self
            .users
            .find_by_id(&query.user_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UserNotFound,
                    format!("User not found: {}", query.user_id),
                )
            })?;

        // Self or admin.
        if !metadata.requester.is_admin && user.identity_id() != metadata.requester.subject {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only the user or an admin may export this data",
            ));
        }

        let registrations = self
            .registrations
            .list_for_user(&query.user_id)
            .await?
            .into_iter()
            .map(|r| RegistrationExport {
                id: *r.id(),
                event_id: *r.live_event_id(),
                status: r.status(),
                position_in_queue: r.position_in_queue(),
                registered_at: *r.registered_at(),
                notes: r.notes().map(String::from),
            })
            .collect();

        Ok(UserExport {
            user: UserProfileExport {
                id: *user.id(),
                identity_id: user.identity_id().to_string(),
                email: user.email().to_string(),
                first_name: user.first_name().to_string(),
                last_name: user.last_name().to_string(),
                phone: user.phone().map(String::from),
                is_active: user.is_active(),
                created_at: *user.created_at(),
            },
            registrations,
            exported_at: Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::Requester;
    use crate::domain::user::User;
    use crate::ports::UserRepository as _;

    async fn seeded() -> (Arc<InMemoryStore>, User) {
        let store = Arc::new(InMemoryStore::new());
        let user = User::new(
            UserId::new(),
            "subject-123".to_string(),
            "ada@example.com".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            None,
        )
        .unwrap();
        store.save(&user).await.unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn self_export_succeeds() {
        let (store, user) = seeded().await;
        let handler = ExportUserHandler::new(store.clone(), store.clone());

        let export = handler
            .handle(
                ExportUserQuery { user_id: *user.id() },
                CommandMetadata::new(Requester::user("subject-123")),
            )
            .await
            .unwrap();

        assert_eq!(export.user.email, "ada@example.com");
        assert!(export.registrations.is_empty());
    }

    #[tokio::test]
    async fn stranger_is_forbidden() {
        let (store, user) = seeded().await;
        let handler = ExportUserHandler::new(store.clone(), store.clone());

        let err = handler
            .handle(
                ExportUserQuery { user_id: *user.id() },
                CommandMetadata::new(Requester::user("someone-else")),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn admin_can_export_anyone() {
        let (store, user) = seeded().await;
        let handler = ExportUserHandler::new(store.clone(), store.clone());
        handler
            .handle(
                ExportUserQuery { user_id: *user.id() },
                CommandMetadata::test_admin(),
            )
            .await
            .unwrap();
    }
}
