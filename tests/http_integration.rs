//! HTTP integration tests for the billing API.
//!
//! Builds the full router over the in-memory store and drives it with
//! `tower::ServiceExt::oneshot`, asserting status codes and JSON bodies.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tutorly::adapters::http::middleware::{ADMIN_HEADER, USER_HEADER};
use tutorly::adapters::http::{billing_router, BillingAppState, BillingSettings};
use tutorly::adapters::InMemoryBillingStore;
use tutorly::domain::payment::PaymentSignatureVerifier;

// =============================================================================
// Test Infrastructure
// =============================================================================

const SECRET: &str = "rzp_test_http_secret";

fn app() -> Router {
    let state = BillingAppState::in_memory(
        Arc::new(InMemoryBillingStore::new()),
        Arc::new(PaymentSignatureVerifier::new(SECRET)),
        BillingSettings::default(),
    );
    billing_router(state, Duration::from_secs(5))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_plan(app: &Router, name: &str, price: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/admin/plans",
        &[(ADMIN_HEADER, "admin-http")],
        Some(json!({
            "name": name,
            "price_minor_units": price,
            "billing_period": "monthly",
            "features": ["Recorded lectures"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn start_trial(app: &Router, user: &str, plan_id: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/subscriptions/trial",
        &[(USER_HEADER, user)],
        Some(json!({ "plan_id": plan_id })),
    )
    .await
}

// =============================================================================
// Plans
// =============================================================================

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn created_plan_is_listed_with_default_currency() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;

    let (status, body) = send(&app, "GET", "/api/plans", &[], None).await;

    assert_eq!(status, StatusCode::OK);
    let plans = body.as_array().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0]["id"], plan_id.as_str());
    assert_eq!(plans[0]["currency"], "INR");
    assert_eq!(plans[0]["active"], true);
}

#[tokio::test]
async fn unknown_plan_is_404() {
    let app = app();
    let (status, body) = send(
        &app,
        "GET",
        "/api/plans/7c9e6679-7425-40de-944b-e07fc1f90ae7",
        &[],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "PLAN_NOT_FOUND");
}

#[tokio::test]
async fn plan_creation_requires_admin_header() {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/admin/plans",
        &[],
        Some(json!({
            "name": "Monthly",
            "price_minor_units": 100,
            "billing_period": "monthly"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Learner subscription
// =============================================================================

#[tokio::test]
async fn trial_is_created_and_grants_access() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;

    let (status, body) = start_trial(&app, "learner-http", &plan_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "trial");
    assert_eq!(body["status_label"], "Free trial");

    let (status, access) = send(
        &app,
        "GET",
        "/api/subscriptions/me/access",
        &[(USER_HEADER, "learner-http")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(access["has_access"], true);
}

#[tokio::test]
async fn second_trial_conflicts() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;
    start_trial(&app, "learner-twice", &plan_id).await;

    let (status, body) = start_trial(&app, "learner-twice", &plan_id).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], "OPEN_SUBSCRIPTION_EXISTS");
}

#[tokio::test]
async fn access_check_without_identity_is_unauthorized() {
    let app = app();
    let (status, _) = send(&app, "GET", "/api/subscriptions/me/access", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn learner_cancel_ends_access() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;
    start_trial(&app, "learner-leaving", &plan_id).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/subscriptions/me/cancel",
        &[(USER_HEADER, "learner-leaving")],
        Some(json!({ "reason": "too expensive" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancel_reason"], "too expensive");
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn webhook_with_bad_signature_gets_generic_rejection() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;
    let (_, trial) = start_trial(&app, "learner-forged", &plan_id).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/webhooks/payments",
        &[],
        Some(json!({
            "razorpay_order_id": "order_1",
            "razorpay_payment_id": "pay_1",
            "razorpay_signature": "deadbeef",
            "subscription_id": trial["id"],
            "plan_id": plan_id
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "PAYMENT_NOT_CONFIRMED");
    assert_eq!(body["message"], "Payment could not be confirmed");
}

#[tokio::test]
async fn webhook_with_undecodable_body_gets_generic_rejection() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payments")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payment could not be confirmed");
}

#[tokio::test]
async fn signed_webhook_activates_and_duplicate_is_reported() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;
    let (_, trial) = start_trial(&app, "learner-paying", &plan_id).await;
    let signature = PaymentSignatureVerifier::new(SECRET)
        .sign("order_ok", "pay_ok")
        .unwrap();
    let payload = json!({
        "razorpay_order_id": "order_ok",
        "razorpay_payment_id": "pay_ok",
        "razorpay_signature": signature,
        "subscription_id": trial["id"],
        "plan_id": plan_id
    });

    let (status, first) = send(&app, "POST", "/api/webhooks/payments", &[], Some(payload.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "processed");

    let (status, second) = send(&app, "POST", "/api/webhooks/payments", &[], Some(payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "duplicate");
    assert_eq!(second["payment_id"], first["payment_id"]);

    let (_, access) = send(
        &app,
        "GET",
        "/api/subscriptions/me/access",
        &[(USER_HEADER, "learner-paying")],
        None,
    )
    .await;
    assert_eq!(access["subscription"]["status"], "active");
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn override_without_reason_is_rejected_with_guard() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;
    let (_, trial) = start_trial(&app, "learner-override", &plan_id).await;
    let id = trial["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/admin/subscriptions/{}/override", id),
        &[(ADMIN_HEADER, "admin-http")],
        Some(json!({ "target_status": "active", "reason": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "OVERRIDE_REJECTED");
    assert_eq!(body["details"]["guard"], "missing_reason");
}

#[tokio::test]
async fn override_is_visible_in_audit_history() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;
    let (_, trial) = start_trial(&app, "learner-comped", &plan_id).await;
    let id = trial["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/admin/subscriptions/{}/override", id),
        &[(ADMIN_HEADER, "admin-http")],
        Some(json!({ "target_status": "active", "reason": "Scholarship" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");

    let (status, audit) = send(
        &app,
        "GET",
        &format!("/api/admin/subscriptions/{}/audit", id),
        &[(ADMIN_HEADER, "admin-http")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = audit["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["action"], "admin_override");
    assert_eq!(entries[1]["reason"], "Scholarship");
}

#[tokio::test]
async fn admin_listing_filters_by_status() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;
    start_trial(&app, "learner-one", &plan_id).await;
    start_trial(&app, "learner-two", &plan_id).await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/admin/subscriptions?status=trial&limit=1",
        &[(ADMIN_HEADER, "admin-http")],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn analytics_overview_counts_trials() {
    let app = app();
    let plan_id = create_plan(&app, "Monthly", 29900).await;
    start_trial(&app, "learner-stats", &plan_id).await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/admin/analytics/overview?days=7",
        &[(ADMIN_HEADER, "admin-http")],
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trial_count"], 1);
    assert_eq!(body["new_subscriptions"], 1);
}
