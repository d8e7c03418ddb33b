//! PostgreSQL implementation of UserStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::order::PlanType;
use crate::domain::user::{AccountStatus, SubscriptionStatus, User};
use crate::ports::UserStore;

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    account_status: String,
    subscription_status: String,
    plan: Option<String>,
    subscription_expires_at: Option<DateTime<Utc>>,
    report_credits: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str| DomainError::database(format!("Invalid {} in users row", field));

        Ok(User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            account_status: row
                .account_status
                .parse::<AccountStatus>()
                .map_err(|_| corrupt("account_status"))?,
            subscription_status: row
                .subscription_status
                .parse::<SubscriptionStatus>()
                .map_err(|_| corrupt("subscription_status"))?,
            plan: row
                .plan
                .map(|plan| plan.parse::<PlanType>())
                .transpose()
                .map_err(|_| corrupt("plan"))?,
            subscription_expires_at: row.subscription_expires_at.map(Timestamp::from_datetime),
            report_credits: row.report_credits,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_USER: &str = r#"
    SELECT id, email, account_status, subscription_status, plan,
           subscription_expires_at, report_credits, created_at, updated_at
    FROM users
"#;

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE LOWER(email) = LOWER($1)", SELECT_USER))
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find user by email: {}", e)))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_USER))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        row.map(User::try_from).transpose()
    }

    async fn upsert(&self, user: &User) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, account_status, subscription_status, plan,
                subscription_expires_at, report_credits, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                account_status = EXCLUDED.account_status,
                subscription_status = EXCLUDED.subscription_status,
                plan = EXCLUDED.plan,
                subscription_expires_at = EXCLUDED.subscription_expires_at,
                report_credits = EXCLUDED.report_credits,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(user.account_status.as_str())
        .bind(user.subscription_status.as_str())
        .bind(user.plan.map(|plan| plan.as_str()))
        .bind(user.subscription_expires_at.map(|ts| *ts.as_datetime()))
        .bind(user.report_credits)
        .bind(user.created_at.as_datetime())
        .bind(user.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("users_email_key") {
                    return DomainError::new(ErrorCode::Conflict, "Email belongs to another user");
                }
            }
            DomainError::database(format!("Failed to upsert user: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            account_status: "pending_setup".to_string(),
            subscription_status: "premium".to_string(),
            plan: Some("annual".to_string()),
            subscription_expires_at: Some(Utc::now()),
            report_credits: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_maps_to_user() {
        let user = User::try_from(row()).unwrap();
        assert_eq!(user.account_status, AccountStatus::PendingSetup);
        assert_eq!(user.subscription_status, SubscriptionStatus::Premium);
        assert_eq!(user.plan, Some(PlanType::Annual));
    }

    #[test]
    fn missing_plan_stays_none() {
        let user = User::try_from(UserRow { plan: None, ..row() }).unwrap();
        assert_eq!(user.plan, None);
    }

    #[test]
    fn unknown_account_status_is_rejected() {
        let err = User::try_from(UserRow {
            account_status: "banned".to_string(),
            ..row()
        })
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
