//! Supabase GoTrue admin API adapter for the IdentityStore port.
//!
//! Uses the service-role key, sent both as `apikey` and as a bearer token.
//! The admin API has no email filter, so `find_by_email` stays unsupported
//! and recovery falls back to paging through `list_users`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::foundation::UserId;
use crate::ports::{Identity, IdentityError, IdentityStore};

/// Longest error body carried into `IdentityError::Rejected`.
const MAX_ERROR_BODY: usize = 200;

pub struct SupabaseIdentityStore {
    base_url: String,
    service_role_key: SecretString,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<GoTrueUser> for Identity {
    fn from(user: GoTrueUser) -> Self {
        Identity {
            id: UserId::from_uuid(user.id),
            email: user.email.unwrap_or_default().to_lowercase(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueUserList {
    #[serde(default)]
    users: Vec<GoTrueUser>,
}

impl SupabaseIdentityStore {
    pub fn new(
        base_url: impl Into<String>,
        service_role_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_role_key,
            client,
        })
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/auth/v1/admin/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.service_role_key.expose_secret();
        request.header("apikey", key.as_str()).bearer_auth(key)
    }
}

fn transport_error(err: reqwest::Error) -> IdentityError {
    if err.is_timeout() {
        IdentityError::Unavailable("request timed out".to_string())
    } else {
        IdentityError::Unavailable(err.to_string())
    }
}

/// Maps a non-success GoTrue response to the port's error vocabulary.
fn classify_failure(status: StatusCode, body: &str) -> IdentityError {
    let lowered = body.to_lowercase();
    let conflict = lowered.contains("email_exists")
        || lowered.contains("already been registered")
        || lowered.contains("already registered");

    if conflict && matches!(status.as_u16(), 400 | 409 | 422) {
        IdentityError::EmailExists
    } else if status == StatusCode::NOT_FOUND {
        IdentityError::NotFound
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        IdentityError::Unavailable(format!("status {}", status.as_u16()))
    } else {
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        IdentityError::Rejected(format!("status {}: {}", status.as_u16(), body))
    }
}

async fn failure(response: reqwest::Response) -> IdentityError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify_failure(status, &body)
}

#[async_trait]
impl IdentityStore for SupabaseIdentityStore {
    async fn create_user(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, IdentityError> {
        let response = self
            .authorized(self.client.post(self.admin_url("users")))
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
                "email_confirm": true,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        let user: GoTrueUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Rejected(format!("unreadable user payload: {}", e)))?;
        Ok(user.into())
    }

    async fn list_users(&self, page: u32, per_page: u32) -> Result<Vec<Identity>, IdentityError> {
        let response = self
            .authorized(self.client.get(self.admin_url("users")))
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        let list: GoTrueUserList = response
            .json()
            .await
            .map_err(|e| IdentityError::Rejected(format!("unreadable user list: {}", e)))?;
        Ok(list.users.into_iter().map(Identity::from).collect())
    }

    async fn update_password(
        &self,
        id: &UserId,
        password: &SecretString,
    ) -> Result<(), IdentityError> {
        let response = self
            .authorized(self.client.put(self.admin_url(&format!("users/{}", id))))
            .json(&json!({ "password": password.expose_secret() }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        Ok(())
    }
}
