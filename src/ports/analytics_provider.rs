//! Analytics provider port for purchase conversions.

use crate::domain::analytics::PurchaseEvent;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("analytics provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error talking to analytics provider: {0}")]
    Network(String),
}

/// Port for a conversions API.
#[async_trait]
pub trait AnalyticsProvider: Send + Sync {
    async fn send_purchase(&self, event: &PurchaseEvent) -> Result<(), AnalyticsError>;
}
