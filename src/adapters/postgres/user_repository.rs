//! PostgreSQL implementation of UserRepository with PII encryption at rest.
//!
//! PII columns (`email`, names, `phone`) pass through the configured
//! `PiiCipher` on the way in and out; `email_digest` carries the
//! deterministic SHA-256 of the normalized email for the unique index and
//! equality lookups, since AES-GCM ciphertext is randomized.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::user::User;
use crate::ports::{PiiCipher, UserRepository};

fn db(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(context, e)
}

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
    cipher: Arc<dyn PiiCipher>,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool, cipher: Arc<dyn PiiCipher>) -> Self {
        Self { pool, cipher }
    }

    fn row_to_user(&self, row: sqlx::postgres::PgRow) -> Result<User, DomainError> {
        let id: uuid::Uuid = row.try_get("id").map_err(db("Failed to get id"))?;
        let identity_id: String = row
            .try_get("identity_id")
            .map_err(db("Failed to get identity_id"))?;
        let email: String = row.try_get("email").map_err(db("Failed to get email"))?;
        let first_name: String = row
            .try_get("first_name")
            .map_err(db("Failed to get first_name"))?;
        let last_name: String = row
            .try_get("last_name")
            .map_err(db("Failed to get last_name"))?;
        let phone: Option<String> = row.try_get("phone").map_err(db("Failed to get phone"))?;
        let is_active: bool = row
            .try_get("is_active")
            .map_err(db("Failed to get is_active"))?;
        let created_at: chrono::DateTime<chrono::Utc> = row
            .try_get("created_at")
            .map_err(db("Failed to get created_at"))?;
        let updated_at: chrono::DateTime<chrono::Utc> = row
            .try_get("updated_at")
            .map_err(db("Failed to get updated_at"))?;

        Ok(User::reconstitute(
            UserId::from_uuid(id),
            identity_id,
            self.cipher.decrypt(&email),
            self.cipher.decrypt(&first_name),
            self.cipher.decrypt(&last_name),
            phone.map(|p| self.cipher.decrypt(&p)),
            is_active,
            Timestamp::from_datetime(created_at),
            Timestamp::from_datetime(updated_at),
        ))
    }

    const SELECT: &'static str =
        "SELECT id, identity_id, email, first_name, last_name, phone, is_active, \
                created_at, updated_at \
         FROM users";
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn save(&self, user: &User) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO users \
             (id, identity_id, email, email_digest, first_name, last_name, phone, \
              is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(user.id().as_uuid())
        .bind(user.identity_id())
        .bind(self.cipher.encrypt(user.email())?)
        .bind(self.cipher.digest(user.email()))
        .bind(self.cipher.encrypt(user.first_name())?)
        .bind(self.cipher.encrypt(user.last_name())?)
        .bind(user.phone().map(|p| self.cipher.encrypt(p)).transpose()?)
        .bind(user.is_active())
        .bind(user.created_at().as_datetime())
        .bind(user.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db("Failed to insert user"))?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE users SET \
                 identity_id = $2, email = $3, email_digest = $4, first_name = $5, \
                 last_name = $6, phone = $7, is_active = $8, updated_at = $9 \
             WHERE id = $1",
        )
        .bind(user.id().as_uuid())
        .bind(user.identity_id())
        .bind(self.cipher.encrypt(user.email())?)
        .bind(self.cipher.digest(user.email()))
        .bind(self.cipher.encrypt(user.first_name())?)
        .bind(self.cipher.encrypt(user.last_name())?)
        .bind(user.phone().map(|p| self.cipher.encrypt(p)).transpose()?)
        .bind(user.is_active())
        .bind(user.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db("Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::UserNotFound,
                format!("User not found: {}", user.id()),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", Self::SELECT))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db("Failed to fetch user"))?;

        row.map(|r| self.row_to_user(r)).transpose()
    }

    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE identity_id = $1", Self::SELECT))
            .bind(identity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db("Failed to fetch user by identity"))?;

        row.map(|r| self.row_to_user(r)).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE email_digest = $1", Self::SELECT))
            .bind(self.cipher.digest(email))
            .fetch_optional(&self.pool)
            .await
            .map_err(db("Failed to fetch user by email"))?;

        row.map(|r| self.row_to_user(r)).transpose()
    }
}
