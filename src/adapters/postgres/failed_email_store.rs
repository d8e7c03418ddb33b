//! PostgreSQL implementation of FailedEmailStore.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::email::FailedEmailRecord;
use crate::domain::foundation::DomainError;
use crate::ports::FailedEmailStore;

pub struct PostgresFailedEmailStore {
    pool: PgPool,
}

impl PostgresFailedEmailStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FailedEmailStore for PostgresFailedEmailStore {
    async fn insert(&self, record: &FailedEmailRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO failed_emails (
                id, recipient, email_type, subject, error, retry_count,
                status, order_id, user_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.recipient)
        .bind(record.email_type.as_str())
        .bind(&record.subject)
        .bind(&record.error)
        .bind(record.retry_count)
        .bind(record.status.as_str())
        .bind(record.order_id.as_ref().map(|id| id.as_str()))
        .bind(record.user_id.map(|id| *id.as_uuid()))
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record failed email: {}", e)))?;

        Ok(())
    }
}
