//! PostgreSQL implementation of SetupTokenStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::setup_token::SetupToken;
use crate::ports::{CleanupCounts, SetupTokenStore};

pub struct PostgresSetupTokenStore {
    pool: PgPool,
}

impl PostgresSetupTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SetupTokenRow {
    token: String,
    user_id: Uuid,
    email: String,
    expires_at: DateTime<Utc>,
    used: bool,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<SetupTokenRow> for SetupToken {
    fn from(row: SetupTokenRow) -> Self {
        SetupToken {
            token: row.token.trim().to_string(),
            user_id: UserId::from_uuid(row.user_id),
            email: row.email,
            expires_at: Timestamp::from_datetime(row.expires_at),
            used: row.used,
            used_at: row.used_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        }
    }
}

#[async_trait]
impl SetupTokenStore for PostgresSetupTokenStore {
    async fn insert(&self, token: &SetupToken) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO setup_tokens (token, user_id, email, expires_at, used, used_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id.as_uuid())
        .bind(&token.email)
        .bind(token.expires_at.as_datetime())
        .bind(token.used)
        .bind(token.used_at.map(|ts| *ts.as_datetime()))
        .bind(token.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert setup token: {}", e)))?;

        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<SetupToken>, DomainError> {
        let row: Option<SetupTokenRow> = sqlx::query_as(
            r#"
            SELECT token, user_id, email, expires_at, used, used_at, created_at
            FROM setup_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find setup token: {}", e)))?;

        Ok(row.map(SetupToken::from))
    }

    async fn mark_used_if_unused(
        &self,
        token: &str,
        used_at: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE setup_tokens SET used = TRUE, used_at = $2
            WHERE token = $1 AND NOT used AND expires_at > $2
            "#,
        )
        .bind(token)
        .bind(used_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to consume setup token: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn invalidate_for_user(
        &self,
        user_id: &UserId,
        except: Option<&str>,
        used_at: Timestamp,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE setup_tokens SET used = TRUE, used_at = $3
            WHERE user_id = $1 AND NOT used AND ($2::TEXT IS NULL OR token <> $2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(except)
        .bind(used_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to invalidate setup tokens: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn delete_stale(&self, cutoff: Timestamp) -> Result<CleanupCounts, DomainError> {
        let expired = sqlx::query("DELETE FROM setup_tokens WHERE NOT used AND expires_at < $1")
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to delete expired tokens: {}", e)))?
            .rows_affected();

        let used = sqlx::query(
            "DELETE FROM setup_tokens WHERE used AND COALESCE(used_at, created_at) < $1",
        )
        .bind(cutoff.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to delete used tokens: {}", e)))?
        .rows_affected();

        Ok(CleanupCounts { expired, used })
    }
}
