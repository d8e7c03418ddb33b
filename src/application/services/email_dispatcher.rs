//! EmailDispatcher - delivery with retry, backoff and dead-lettering.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::domain::email::{EmailMessage, EmailMetadata, FailedEmailRecord};
use crate::ports::{EmailDeliveryError, EmailProvider, EmailReceipt, FailedEmailStore};

/// Retry schedule for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after each retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Final outcome of a send that never succeeded.
#[derive(Debug, Error)]
#[error("email not delivered after {attempts} attempt(s): {source}")]
pub struct DeliveryFailure {
    pub attempts: u32,
    #[source]
    pub source: EmailDeliveryError,
}

pub struct EmailDispatcher {
    provider: Arc<dyn EmailProvider>,
    failed_emails: Arc<dyn FailedEmailStore>,
    policy: RetryPolicy,
}

impl EmailDispatcher {
    pub fn new(
        provider: Arc<dyn EmailProvider>,
        failed_emails: Arc<dyn FailedEmailStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            failed_emails,
            policy,
        }
    }

    /// One attempt, no retry.
    pub async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, EmailDeliveryError> {
        self.provider.send(message).await
    }

    /// Retries transient failures with exponential backoff. Permanent
    /// failures return immediately.
    pub async fn send_with_retry(&self, message: &EmailMessage) -> Result<EmailReceipt, DeliveryFailure> {
        let mut attempt = 1;
        loop {
            match self.send(message).await {
                Ok(receipt) => {
                    tracing::info!(
                        email_type = message.email_type.as_str(),
                        attempt,
                        provider_id = receipt.provider_id.as_deref().unwrap_or(""),
                        "email accepted by provider"
                    );
                    return Ok(receipt);
                }
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        email_type = message.email_type.as_str(),
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient email failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(DeliveryFailure {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    /// Sends with retry; on final failure writes a `permanently_failed`
    /// record for operators. Returns whether the email was delivered.
    pub async fn send_with_logging(&self, message: &EmailMessage, metadata: &EmailMetadata) -> bool {
        let failure = match self.send_with_retry(message).await {
            Ok(_) => return true,
            Err(failure) => failure,
        };

        tracing::error!(
            email_type = message.email_type.as_str(),
            order_id = metadata.order_id.as_ref().map(|id| id.as_str()).unwrap_or(""),
            attempts = failure.attempts,
            transient = failure.source.is_transient(),
            error = %failure.source,
            "email delivery failed permanently"
        );

        let record = FailedEmailRecord::permanently_failed(
            message,
            failure.source.to_string(),
            failure.attempts,
            metadata,
        );
        if let Err(err) = self.failed_emails.insert(&record).await {
            tracing::error!(
                email_type = message.email_type.as_str(),
                error = %err,
                requires_manual_action = true,
                "could not record failed email"
            );
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::email::MockEmailProvider;
    use crate::adapters::memory::InMemoryFailedEmailStore;
    use crate::domain::email::FailedEmailStatus;
    use crate::domain::foundation::{OrderId, UserId};
    use crate::domain::order::PlanType;
    use std::time::Instant;

    fn message() -> EmailMessage {
        EmailMessage::account_setup("g@example.com", "https://app.test/setup?token=t", PlanType::Annual, 48)
    }

    fn http(status: u16) -> EmailDeliveryError {
        EmailDeliveryError::Http {
            status,
            body: "provider says no".to_string(),
        }
    }

    fn dispatcher(
        provider: Arc<MockEmailProvider>,
    ) -> (EmailDispatcher, Arc<InMemoryFailedEmailStore>) {
        let failed = Arc::new(InMemoryFailedEmailStore::new());
        let dispatcher = EmailDispatcher::new(
            provider,
            failed.clone(),
            RetryPolicy::new(3, Duration::from_millis(2)),
        );
        (dispatcher, failed)
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn policy_never_allows_zero_attempts() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn first_attempt_success_sends_once() {
        let provider = Arc::new(MockEmailProvider::new());
        let (dispatcher, failed) = dispatcher(provider.clone());

        assert!(dispatcher.send_with_retry(&message()).await.is_ok());
        assert_eq!(provider.attempts(), 1);
        assert!(failed.records().await.is_empty());
    }

    #[tokio::test]
    async fn transient_failure_then_success_is_delivered() {
        let provider = Arc::new(MockEmailProvider::new().with_failures(vec![http(503), http(429)]));
        let (dispatcher, _) = dispatcher(provider.clone());

        assert!(dispatcher.send_with_retry(&message()).await.is_ok());
        assert_eq!(provider.attempts(), 3);
        assert_eq!(provider.sent().len(), 1);
    }

    #[tokio::test]
    async fn server_error_retries_to_max_with_growing_delays() {
        let provider = Arc::new(MockEmailProvider::failing(http(500)));
        let (dispatcher, _) = dispatcher(provider.clone());

        let started = Instant::now();
        let failure = dispatcher.send_with_retry(&message()).await.unwrap_err();

        assert_eq!(failure.attempts, 3);
        assert_eq!(provider.attempts(), 3);
        // 2ms then 4ms of backoff
        assert!(started.elapsed() >= Duration::from_millis(6));
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let provider = Arc::new(MockEmailProvider::failing(http(400)));
        let (dispatcher, _) = dispatcher(provider.clone());

        let failure = dispatcher.send_with_retry(&message()).await.unwrap_err();
        assert_eq!(failure.attempts, 1);
        assert_eq!(provider.attempts(), 1);
    }

    #[tokio::test]
    async fn network_errors_and_timeouts_are_retried() {
        let provider = Arc::new(MockEmailProvider::new().with_failures(vec![
            EmailDeliveryError::Timeout,
            EmailDeliveryError::Network("connection reset".into()),
        ]));
        let (dispatcher, _) = dispatcher(provider.clone());

        assert!(dispatcher.send_with_retry(&message()).await.is_ok());
        assert_eq!(provider.attempts(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_recorded_on_first_attempt() {
        let provider = Arc::new(MockEmailProvider::failing(http(400)));
        let (dispatcher, failed) = dispatcher(provider.clone());
        let metadata = EmailMetadata {
            order_id: Some(OrderId::new("ORD_1").unwrap()),
            user_id: Some(UserId::new()),
        };

        assert!(!dispatcher.send_with_logging(&message(), &metadata).await);

        let records = failed.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].retry_count, 1);
        assert_eq!(records[0].status, FailedEmailStatus::PermanentlyFailed);
        assert_eq!(records[0].order_id, metadata.order_id);
        assert!(records[0].error.contains("400"));
    }

    #[tokio::test]
    async fn exhausted_retries_are_recorded_with_attempt_count() {
        let provider = Arc::new(MockEmailProvider::failing(http(502)));
        let (dispatcher, failed) = dispatcher(provider);

        assert!(!dispatcher.send_with_logging(&message(), &EmailMetadata::default()).await);
        assert_eq!(failed.records().await[0].retry_count, 3);
    }

    #[tokio::test]
    async fn delivered_email_writes_no_record() {
        let provider = Arc::new(MockEmailProvider::new());
        let (dispatcher, failed) = dispatcher(provider);

        assert!(dispatcher.send_with_logging(&message(), &EmailMetadata::default()).await);
        assert!(failed.records().await.is_empty());
    }
}
