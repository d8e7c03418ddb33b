//! Resend HTTP API adapter for the EmailProvider port.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::EmailConfig;
use crate::domain::email::EmailMessage;
use crate::ports::{EmailDeliveryError, EmailProvider, EmailReceipt};

/// Longest provider error body kept on a failure.
const MAX_ERROR_BODY: usize = 500;

pub struct ResendEmailProvider {
    api_url: String,
    api_key: SecretString,
    from: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    tags: [Tag<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Tag<'a> {
    name: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

impl ResendEmailProvider {
    pub fn new(
        api_url: impl Into<String>,
        api_key: SecretString,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            from: from.into(),
            client,
        })
    }

    pub fn from_config(config: &EmailConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.api_url.clone(),
            SecretString::new(config.resend_api_key.clone()),
            config.from_header(),
            config.timeout(),
        )
    }
}

fn transport_error(err: reqwest::Error) -> EmailDeliveryError {
    if err.is_timeout() {
        EmailDeliveryError::Timeout
    } else if err.is_builder() {
        EmailDeliveryError::InvalidRequest(err.to_string())
    } else {
        EmailDeliveryError::Network(err.to_string())
    }
}

#[async_trait]
impl EmailProvider for ResendEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, EmailDeliveryError> {
        let request = SendEmailRequest {
            from: &self.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
            tags: [Tag {
                name: "email_type",
                value: message.email_type.as_str(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(EmailDeliveryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        // A 2xx is accepted even if the body is not what we expect.
        let provider_id = response
            .json::<SendEmailResponse>()
            .await
            .ok()
            .and_then(|body| body.id);
        Ok(EmailReceipt { provider_id })
    }
}
