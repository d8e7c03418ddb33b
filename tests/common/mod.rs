//! Shared fixtures for the integration tests.
//!
//! Builds the real object graph through `bootstrap::build` on in-memory
//! stores and mock third-party providers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use payflow::adapters::analytics::MockAnalyticsProvider;
use payflow::adapters::email::MockEmailProvider;
use payflow::adapters::http::app_router;
use payflow::adapters::identity::InMemoryIdentityStore;
use payflow::adapters::memory::{
    InMemoryFailedEmailStore, InMemoryOrderStore, InMemorySetupTokenStore, InMemoryUserStore,
};
use payflow::bootstrap::{self, Application, Collaborators, Stores};
use payflow::config::{
    AnalyticsConfig, AppConfig, DatabaseConfig, EmailConfig, IdentityConfig, PaymentConfig,
    ServerConfig,
};
use payflow::domain::payment::{encrypt, stringify_fields};

pub const WORKING_KEY: &str = "0123456789ABCDEF0123456789ABCDEF";
pub const FRONTEND: &str = "https://app.example.com";

pub fn config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        payment: PaymentConfig {
            merchant_id: "12345".to_string(),
            access_code: "AVXX00TEST".to_string(),
            working_key: WORKING_KEY.to_string(),
            gateway_url: "https://secure.gateway.test/transaction".to_string(),
            redirect_url: "https://api.example.com/api/payments/callback".to_string(),
            cancel_url: "https://api.example.com/api/payments/cancel".to_string(),
            frontend_url: FRONTEND.to_string(),
            annual_price_minor: 199_900,
            single_price_minor: 49_900,
            currency: "INR".to_string(),
            language: "EN".to_string(),
        },
        email: EmailConfig {
            base_backoff_ms: 0,
            ..EmailConfig::default()
        },
        identity: IdentityConfig::default(),
        analytics: AnalyticsConfig::default(),
    }
}

pub struct TestApp {
    pub app: Application,
    pub router: Router,
    pub orders: Arc<InMemoryOrderStore>,
    pub users: Arc<InMemoryUserStore>,
    pub tokens: Arc<InMemorySetupTokenStore>,
    pub failed_emails: Arc<InMemoryFailedEmailStore>,
    pub identities: Arc<InMemoryIdentityStore>,
    pub email: MockEmailProvider,
    pub analytics: Arc<MockAnalyticsProvider>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_email(MockEmailProvider::new())
    }

    pub fn with_email(email: MockEmailProvider) -> Self {
        let orders = Arc::new(InMemoryOrderStore::new());
        let users = Arc::new(InMemoryUserStore::new());
        let tokens = Arc::new(InMemorySetupTokenStore::new());
        let failed_emails = Arc::new(InMemoryFailedEmailStore::new());
        let identities = Arc::new(InMemoryIdentityStore::new());
        let analytics = Arc::new(MockAnalyticsProvider::new());

        let app = bootstrap::build(
            &config(),
            Stores {
                orders: orders.clone(),
                users: users.clone(),
                tokens: tokens.clone(),
                failed_emails: failed_emails.clone(),
            },
            Collaborators {
                identities: identities.clone(),
                email: Arc::new(email.clone()),
                analytics: analytics.clone(),
            },
        );
        let router = app_router(app.state.clone(), app.request_timeout);

        Self {
            app,
            router,
            orders,
            users,
            tokens,
            failed_emails,
            identities,
            email,
            analytics,
        }
    }

    /// Waits for detached email and analytics tasks.
    pub async fn settle(&self) {
        self.app.tasks.drain().await;
    }

    pub async fn post_callback(&self, enc_resp: &str) -> Response<Body> {
        self.send(
            Request::post("/api/payments/callback")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("encResp={}", enc_resp)))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Encrypts a gateway response the way the gateway would.
pub fn gateway_response(fields: &[(&str, &str)]) -> String {
    encrypt(&stringify_fields(fields.iter().copied()), WORKING_KEY).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
