//! Axum router configuration for the billing API.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::admin::{
    admin_cancel, analytics_overview, audit_history, create_plan, deactivate_plan,
    list_subscriptions, override_subscription, pause_subscription, run_sweep,
};
use super::handlers::{
    cancel_subscription, check_access, confirm_payment, get_plan, list_plans, payment_webhook,
    start_trial,
};
use super::state::BillingAppState;

/// Learner-facing routes.
///
/// - `GET /plans`, `GET /plans/:plan_id`
/// - `POST /subscriptions/trial`
/// - `GET /subscriptions/me/access`
/// - `POST /subscriptions/me/cancel`
/// - `POST /payments/confirm`
pub fn learner_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/:plan_id", get(get_plan))
        .route("/subscriptions/trial", post(start_trial))
        .route("/subscriptions/me/access", get(check_access))
        .route("/subscriptions/me/cancel", post(cancel_subscription))
        .route("/payments/confirm", post(confirm_payment))
}

/// Gateway webhooks. No identity header; the signature authenticates.
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/payments", post(payment_webhook))
}

pub fn admin_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/plans", post(create_plan))
        .route("/plans/:plan_id/deactivate", post(deactivate_plan))
        .route("/subscriptions", get(list_subscriptions))
        .route("/subscriptions/:subscription_id/override", post(override_subscription))
        .route("/subscriptions/:subscription_id/cancel", post(admin_cancel))
        .route("/subscriptions/:subscription_id/pause", post(pause_subscription))
        .route("/subscriptions/:subscription_id/audit", get(audit_history))
        .route("/analytics/overview", get(analytics_overview))
        .route("/scheduler/sweep", post(run_sweep))
}

/// Complete application: everything under `/api`, plus `/health`.
pub fn billing_router(state: BillingAppState, request_timeout: Duration) -> Router {
    let api = learner_routes()
        .nest("/webhooks", webhook_routes())
        .nest("/admin", admin_routes());

    // Outermost first
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api", api)
        .layer(middleware)
        .with_state(state)
}
