//! Mock email provider for testing.
//!
//! Queued failures are returned first, in order; once the queue is empty
//! every send succeeds unless the mock was built with `failing`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::email::EmailMessage;
use crate::ports::{EmailDeliveryError, EmailProvider, EmailReceipt};

#[derive(Debug, Default)]
struct MockState {
    failures: VecDeque<EmailDeliveryError>,
    always_fail: Option<EmailDeliveryError>,
    attempts: usize,
    sent: Vec<EmailMessage>,
}

#[derive(Debug, Clone, Default)]
pub struct MockEmailProvider {
    state: Arc<Mutex<MockState>>,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next sends with `failures`, then succeeds.
    pub fn with_failures(self, failures: Vec<EmailDeliveryError>) -> Self {
        self.lock().failures = failures.into();
        self
    }

    /// Fails every send with `error`.
    pub fn failing(error: EmailDeliveryError) -> Self {
        let mock = Self::new();
        mock.lock().always_fail = Some(error);
        mock
    }

    /// Number of send attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, EmailDeliveryError> {
        let mut state = self.lock();
        state.attempts += 1;
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        if let Some(err) = &state.always_fail {
            return Err(err.clone());
        }
        state.sent.push(message.clone());
        Ok(EmailReceipt {
            provider_id: Some(format!("mock_{}", state.sent.len())),
        })
    }
}
