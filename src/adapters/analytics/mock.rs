//! Mock and no-op analytics providers.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::analytics::PurchaseEvent;
use crate::ports::{AnalyticsError, AnalyticsProvider};

#[derive(Debug, Default)]
struct MockState {
    error: Option<AnalyticsError>,
    attempts: usize,
    events: Vec<PurchaseEvent>,
}

/// Records delivered events; optionally fails every call.
#[derive(Debug, Clone, Default)]
pub struct MockAnalyticsProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockAnalyticsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: AnalyticsError) -> Self {
        let mock = Self::new();
        mock.lock().error = Some(error);
        mock
    }

    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Events accepted so far.
    pub fn events(&self) -> Vec<PurchaseEvent> {
        self.lock().events.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AnalyticsProvider for MockAnalyticsProvider {
    async fn send_purchase(&self, event: &PurchaseEvent) -> Result<(), AnalyticsError> {
        let mut state = self.lock();
        state.attempts += 1;
        if let Some(err) = &state.error {
            return Err(err.clone());
        }
        state.events.push(event.clone());
        Ok(())
    }
}

/// Used when conversion tracking is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyticsProvider;

#[async_trait]
impl AnalyticsProvider for NoopAnalyticsProvider {
    async fn send_purchase(&self, event: &PurchaseEvent) -> Result<(), AnalyticsError> {
        tracing::debug!(order_id = %event.event_id, "conversion tracking disabled");
        Ok(())
    }
}
