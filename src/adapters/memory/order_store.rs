//! In-memory OrderStore.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, Timestamp, UserId};
use crate::domain::order::{Order, OrderCompletion};
use crate::ports::OrderStore;

/// Orders keyed by id. The write lock makes `complete_if_pending` a single
/// compare-and-set, matching the conditional update in Postgres.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    fail_reads: AtomicBool,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Makes `find_by_id` fail, for exercising storage error paths.
    pub async fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("order {} already exists", order.id),
            ));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DomainError::database("order store unavailable"));
        }
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn complete_if_pending(
        &self,
        id: &OrderId,
        completion: &OrderCompletion,
    ) -> Result<bool, DomainError> {
        let mut orders = self.orders.write().await;
        Ok(orders
            .get_mut(id)
            .map(|order| order.apply_completion(completion))
            .unwrap_or(false))
    }

    async fn claim_provisioning(&self, id: &OrderId) -> Result<bool, DomainError> {
        let mut orders = self.orders.write().await;
        Ok(orders
            .get_mut(id)
            .map(|order| order.claim_provisioning(Timestamp::now()))
            .unwrap_or(false))
    }

    async fn release_provisioning(&self, id: &OrderId) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        if let Some(order) = orders.get_mut(id) {
            order.provisioning_claimed_at = None;
        }
        Ok(())
    }

    async fn link_user(&self, id: &OrderId, user_id: &UserId) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, format!("order {} not found", id))
        })?;
        order.user_id = Some(*user_id);
        Ok(())
    }
}
