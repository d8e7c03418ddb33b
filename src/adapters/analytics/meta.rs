//! Meta Conversions API adapter for the AnalyticsProvider port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};

use crate::domain::analytics::PurchaseEvent;
use crate::ports::{AnalyticsError, AnalyticsProvider};

const MAX_ERROR_BODY: usize = 300;

pub struct MetaConversionsProvider {
    endpoint: String,
    access_token: SecretString,
    test_event_code: Option<String>,
    client: Client,
}

impl MetaConversionsProvider {
    pub fn new(
        api_url: &str,
        api_version: &str,
        pixel_id: &str,
        access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: format!(
                "{}/{}/{}/events",
                api_url.trim_end_matches('/'),
                api_version,
                pixel_id
            ),
            access_token,
            test_event_code: None,
            client,
        })
    }

    /// Routes events to the Events Manager test tab.
    pub fn with_test_event_code(mut self, code: Option<String>) -> Self {
        self.test_event_code = code.filter(|c| !c.trim().is_empty());
        self
    }
}

/// The `data` entry for a purchase. Identifiers arrive already hashed.
fn purchase_payload(event: &PurchaseEvent) -> Value {
    let mut user_data = serde_json::Map::new();
    if let Some(email) = &event.hashed_email {
        user_data.insert("em".into(), json!([email]));
    }
    if let Some(external_id) = &event.hashed_external_id {
        user_data.insert("external_id".into(), json!([external_id]));
    }

    let mut entry = json!({
        "event_name": "Purchase",
        "event_time": event.event_time.as_unix_secs(),
        "event_id": event.event_id.as_str(),
        "action_source": "website",
        "user_data": user_data,
        "custom_data": {
            "value": event.value,
            "currency": event.currency,
            "content_name": event.plan.display_name(),
            "content_type": "product",
            "content_ids": [event.plan.as_str()],
        },
    });
    if let Some(url) = &event.event_source_url {
        entry["event_source_url"] = json!(url);
    }
    entry
}

#[async_trait]
impl AnalyticsProvider for MetaConversionsProvider {
    async fn send_purchase(&self, event: &PurchaseEvent) -> Result<(), AnalyticsError> {
        let mut body = json!({
            "data": [purchase_payload(event)],
            "access_token": self.access_token.expose_secret(),
        });
        if let Some(code) = &self.test_event_code {
            body["test_event_code"] = json!(code);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalyticsError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(AnalyticsError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
