//! PostgreSQL implementation of OrderStore.
//!
//! The terminal write is a single conditional UPDATE guarded by
//! `status = 'pending'`; zero affected rows means another delivery won.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, Timestamp, UserId};
use crate::domain::order::{Order, OrderCompletion, OrderStatus, PlanType};
use crate::ports::OrderStore;

pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    amount_minor: i64,
    currency: String,
    plan_type: String,
    status: String,
    user_id: Option<Uuid>,
    billing_email: Option<String>,
    tracking_id: Option<String>,
    gateway_response: Option<serde_json::Value>,
    provisioning_claimed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: OrderId::new(row.id).map_err(|e| corrupt("id", e))?,
            amount_minor: row.amount_minor,
            currency: row.currency.trim().to_string(),
            plan_type: row.plan_type.parse::<PlanType>().map_err(|e| corrupt("plan_type", e))?,
            status: row.status.parse::<OrderStatus>().map_err(|e| corrupt("status", e))?,
            user_id: row.user_id.map(UserId::from_uuid),
            billing_email: row.billing_email,
            tracking_id: row.tracking_id,
            gateway_response: row.gateway_response,
            provisioning_claimed_at: row.provisioning_claimed_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn corrupt(field: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::database(format!("Invalid {} in orders row: {}", field, err))
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, amount_minor, currency, plan_type, status, user_id,
                billing_email, tracking_id, gateway_response, provisioning_claimed_at,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.amount_minor)
        .bind(&order.currency)
        .bind(order.plan_type.as_str())
        .bind(order.status.as_str())
        .bind(order.user_id.map(|id| *id.as_uuid()))
        .bind(&order.billing_email)
        .bind(&order.tracking_id)
        .bind(&order.gateway_response)
        .bind(order.provisioning_claimed_at.map(|at| *at.as_datetime()))
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("orders_pkey") {
                    return DomainError::new(ErrorCode::Conflict, "Order already exists");
                }
            }
            DomainError::database(format!("Failed to insert order: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, amount_minor, currency, plan_type, status, user_id,
                   billing_email, tracking_id, gateway_response, provisioning_claimed_at,
                   created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find order: {}", e)))?;

        row.map(Order::try_from).transpose()
    }

    async fn complete_if_pending(
        &self,
        id: &OrderId,
        completion: &OrderCompletion,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                tracking_id = $3,
                gateway_response = $4,
                provisioning_claimed_at = CASE WHEN $2::TEXT = 'success' THEN $5::TIMESTAMPTZ END,
                updated_at = $5
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_str())
        .bind(completion.status.as_str())
        .bind(&completion.tracking_id)
        .bind(&completion.gateway_response)
        .bind(completion.completed_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to complete order: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn claim_provisioning(&self, id: &OrderId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET provisioning_claimed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'success' AND provisioning_claimed_at IS NULL
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to claim order provisioning: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_provisioning(&self, id: &OrderId) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE orders SET provisioning_claimed_at = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to release order provisioning: {}", e)))?;

        Ok(())
    }

    async fn link_user(&self, id: &OrderId, user_id: &UserId) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET user_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to link order: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", id),
            ));
        }
        Ok(())
    }
}
