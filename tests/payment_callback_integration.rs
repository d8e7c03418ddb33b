//! End-to-end tests for checkout, gateway callbacks and account setup,
//! driven through the HTTP router.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{gateway_response, json_body, location, TestApp, FRONTEND, WORKING_KEY};
use payflow::domain::email::EmailType;
use payflow::domain::foundation::{OrderId, Timestamp};
use payflow::domain::order::{OrderStatus, PlanType};
use payflow::domain::payment::{decrypt, parse_fields};
use payflow::domain::user::{AccountStatus, SubscriptionStatus};
use payflow::ports::{OrderStore, UserStore};

async fn start_guest_checkout(app: &TestApp, plan: &str, email: &str) -> OrderId {
    let response = app
        .post_json(
            "/api/payments/checkout",
            json!({ "plan_type": plan, "billing_email": email }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    OrderId::new(body["order_id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn checkout_returns_encrypted_request_for_the_gateway() {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/payments/checkout",
            json!({ "plan_type": "annual", "billing_email": "Guest@Example.com" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["access_code"], "AVXX00TEST");
    let fields = parse_fields(&decrypt(body["encRequest"].as_str().unwrap(), WORKING_KEY).unwrap());
    assert_eq!(fields["order_id"], body["order_id"].as_str().unwrap());
    assert_eq!(fields["amount"], "1999.00");
    assert_eq!(fields["merchant_param1"], "annual");
    assert_eq!(fields["billing_email"], "guest@example.com");

    let order_id = OrderId::new(body["order_id"].as_str().unwrap()).unwrap();
    let order = app.orders.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.user_id.is_none());
}

#[tokio::test]
async fn guest_checkout_without_email_is_rejected() {
    let app = TestApp::new();

    let response = app
        .post_json("/api/payments/checkout", json!({ "plan_type": "single" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error_code"], "MISSING_BILLING_EMAIL");
    assert_eq!(app.orders.len().await, 0);
}

#[tokio::test]
async fn guest_annual_purchase_provisions_once_and_replays_cleanly() {
    let app = TestApp::new();
    let order_id = start_guest_checkout(&app, "annual", "guest@example.com").await;
    let enc = gateway_response(&[
        ("order_id", order_id.as_str()),
        ("tracking_id", "3100"),
        ("order_status", "Success"),
        ("amount", "1999.00"),
        ("billing_email", "guest@example.com"),
    ]);

    let first = location(&app.post_callback(&enc).await);
    app.settle().await;

    assert_eq!(
        first,
        format!(
            "{}/payment/success?order_id={}&tracking_id=3100&plan_type=annual",
            FRONTEND, order_id
        )
    );

    let order = app.orders.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Success);
    assert_eq!(order.tracking_id.as_deref(), Some("3100"));
    let user_id = order.user_id.expect("order linked to the new user");

    let user = app.users.find_by_id(&user_id).await.unwrap().unwrap();
    assert_eq!(user.email, "guest@example.com");
    assert_eq!(user.account_status, AccountStatus::PendingSetup);
    assert_eq!(user.subscription_status, SubscriptionStatus::Premium);
    assert_eq!(user.plan, Some(PlanType::Annual));
    assert!(user.has_premium(Timestamp::now()));

    assert_eq!(app.identities.len().await, 1);
    assert_eq!(app.tokens.tokens_for(&user_id).await.len(), 1);
    let sent = app.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "guest@example.com");
    assert_eq!(sent[0].email_type, EmailType::AccountSetup);
    assert_eq!(app.analytics.events().len(), 1);

    // Gateway retries the same callback.
    let replay = location(&app.post_callback(&enc).await);
    app.settle().await;

    assert_eq!(replay, first);
    assert_eq!(app.identities.len().await, 1);
    assert_eq!(app.identities.create_calls(), 1);
    assert_eq!(app.tokens.tokens_for(&user_id).await.len(), 1);
    assert_eq!(app.email.sent().len(), 1);
    assert_eq!(app.analytics.events().len(), 1);
    let user = app.users.find_by_id(&user_id).await.unwrap().unwrap();
    assert_eq!(user.plan, Some(PlanType::Annual));
}

#[tokio::test]
async fn setup_link_activates_the_account_once() {
    let app = TestApp::new();
    let order_id = start_guest_checkout(&app, "single", "guest@example.com").await;
    let enc = gateway_response(&[
        ("order_id", order_id.as_str()),
        ("tracking_id", "3101"),
        ("order_status", "Success"),
    ]);
    location(&app.post_callback(&enc).await);
    app.settle().await;

    let user_id = app
        .orders
        .find_by_id(&order_id)
        .await
        .unwrap()
        .unwrap()
        .user_id
        .unwrap();
    let token = app.tokens.tokens_for(&user_id).await[0].token.clone();

    let verify = app.get(&format!("/api/account/setup?token={}", token)).await;
    assert_eq!(verify.status(), StatusCode::OK);
    assert_eq!(json_body(verify).await["email"], "guest@example.com");

    let short = app
        .post_json("/api/account/setup", json!({ "token": token, "password": "short" }))
        .await;
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);

    let done = app
        .post_json(
            "/api/account/setup",
            json!({ "token": token, "password": "a-much-longer-password" }),
        )
        .await;
    assert_eq!(done.status(), StatusCode::OK);
    assert_eq!(json_body(done).await["user_id"], user_id.to_string());

    let user = app.users.find_by_id(&user_id).await.unwrap().unwrap();
    assert_eq!(user.account_status, AccountStatus::Active);
    assert!(app.identities.password_for(&user_id).await.is_some());

    let again = app
        .post_json(
            "/api/account/setup",
            json!({ "token": token, "password": "a-much-longer-password" }),
        )
        .await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    let body = json_body(again).await;
    assert_eq!(body["error_code"], "INVALID_TOKEN");
    assert_eq!(body["details"]["reason"], "already_used");

    let verify_again = app.get(&format!("/api/account/setup?token={}", token)).await;
    assert_eq!(verify_again.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn declined_payment_redirects_with_gateway_reason() {
    let app = TestApp::new();
    let order_id = start_guest_checkout(&app, "single", "guest@example.com").await;
    let enc = gateway_response(&[
        ("order_id", order_id.as_str()),
        ("order_status", "Failure"),
        ("failure_message", "Insufficient Funds"),
    ]);

    let url = location(&app.post_callback(&enc).await);
    app.settle().await;

    assert!(url.starts_with(&format!("{}/payment/failure?", FRONTEND)));
    assert!(url.contains("reason=Insufficient%20Funds"));
    assert!(url.contains("plan_type=single"));
    let order = app.orders.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Failed);
    assert!(order.user_id.is_none());
    assert_eq!(app.identities.len().await, 0);
    assert!(app.email.sent().is_empty());
    assert!(app.analytics.events().is_empty());
}

#[tokio::test]
async fn undecryptable_callback_still_redirects() {
    let app = TestApp::new();

    let url = location(&app.post_callback("zzzz").await);

    assert_eq!(
        url,
        format!(
            "{}/payment/failure?order_id=&reason=payment_verification_failed&plan_type=",
            FRONTEND
        )
    );
}

#[tokio::test]
async fn cancel_without_payload_redirects_to_failure() {
    let app = TestApp::new();

    let response = app
        .send(
            axum::http::Request::post("/api/payments/cancel")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(
        location(&response),
        format!(
            "{}/payment/failure?order_id=&reason=invalid_response&plan_type=",
            FRONTEND
        )
    );
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}
