//! Order store port.
//!
//! The callback's only guard against duplicate delivery lives here:
//! `complete_if_pending` must be a single conditional write.

use crate::domain::foundation::{DomainError, OrderId, UserId};
use crate::domain::order::{Order, OrderCompletion};
use async_trait::async_trait;

/// Persistence for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new pending order.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the id is already taken
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, order: &Order) -> Result<(), DomainError>;

    /// Find an order by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Apply the terminal write only if the order is still pending.
    ///
    /// A successful completion also claims provisioning for the caller.
    ///
    /// Returns `true` if this call performed the transition and `false` if
    /// the order had already left pending (or does not exist). Must be
    /// atomic with respect to concurrent callers for the same order.
    async fn complete_if_pending(
        &self,
        id: &OrderId,
        completion: &OrderCompletion,
    ) -> Result<bool, DomainError>;

    /// Claim provisioning of a paid order whose previous claim was released.
    ///
    /// Returns `true` only for the single caller that took the claim.
    async fn claim_provisioning(&self, id: &OrderId) -> Result<bool, DomainError>;

    /// Drop the provisioning claim so a later delivery can finish the job.
    async fn release_provisioning(&self, id: &OrderId) -> Result<(), DomainError>;

    /// Attach an owning user to a guest order.
    async fn link_user(&self, id: &OrderId, user_id: &UserId) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn OrderStore) {}
    }
}
