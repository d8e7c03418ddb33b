//! ConversionTracker - best-effort purchase reporting.
//!
//! Never fails and never blocks the caller: every error is logged and
//! dropped.

use std::sync::Arc;

use crate::application::BackgroundTasks;
use crate::domain::analytics::PurchaseEvent;
use crate::ports::AnalyticsProvider;

pub struct ConversionTracker {
    provider: Arc<dyn AnalyticsProvider>,
    tasks: Arc<BackgroundTasks>,
}

impl ConversionTracker {
    pub fn new(provider: Arc<dyn AnalyticsProvider>, tasks: Arc<BackgroundTasks>) -> Self {
        Self { provider, tasks }
    }

    /// Sends one purchase event and logs the outcome.
    pub async fn track_purchase(&self, event: PurchaseEvent) {
        send(self.provider.as_ref(), &event).await;
    }

    /// Sends the event from a detached task.
    pub fn track_purchase_in_background(&self, event: PurchaseEvent) {
        let provider = self.provider.clone();
        self.tasks.spawn("conversion_tracking", async move {
            send(provider.as_ref(), &event).await;
        });
    }
}

async fn send(provider: &dyn AnalyticsProvider, event: &PurchaseEvent) {
    match provider.send_purchase(event).await {
        Ok(()) => tracing::info!(
            order_id = %event.event_id,
            plan = event.plan.as_str(),
            "purchase conversion sent"
        ),
        Err(err) => tracing::warn!(
            order_id = %event.event_id,
            error = %err,
            "purchase conversion not sent"
        ),
    }
}
