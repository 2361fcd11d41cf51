//! HTTP handlers for learner-facing and gateway-facing endpoints.

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use super::dto::{CancelRequest, ListPlansParams, PlanResponse, StartTrialRequest, SubscriptionResponse};
use super::error::ApiError;
use super::state::BillingAppState;
use crate::adapters::http::middleware::LearnerIdentity;
use crate::application::handlers::{
    CancelSubscriptionCommand, CheckAccessQuery, ConfirmationSource, GetPlanQuery,
    ListPlansQuery, StartTrialCommand, VerifyPaymentCommand,
};
use crate::domain::foundation::PlanId;
use crate::domain::payment::{GatewayPayload, VerificationError, VerifiedPayment};
use crate::domain::subscription::SubscriptionError;

// ════════════════════════════════════════════════════════════════════════════════
// Plans
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/plans
pub async fn list_plans(
    State(state): State<BillingAppState>,
    Query(params): Query<ListPlansParams>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = state
        .list_plans_handler()
        .handle(ListPlansQuery {
            active_only: params.active_only.unwrap_or(true),
        })
        .await?;

    Ok(Json(
        plans.into_iter().map(PlanResponse::from).collect::<Vec<_>>(),
    ))
}

/// GET /api/plans/:plan_id
pub async fn get_plan(
    State(state): State<BillingAppState>,
    Path(plan_id): Path<PlanId>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state.get_plan_handler().handle(GetPlanQuery { plan_id }).await?;
    Ok(Json(PlanResponse::from(plan)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Learner subscription
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/subscriptions/trial
pub async fn start_trial(
    State(state): State<BillingAppState>,
    LearnerIdentity(user_id): LearnerIdentity,
    Json(request): Json<StartTrialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .start_trial_handler()
        .handle(StartTrialCommand {
            user_id,
            plan_id: request.plan_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(result.subscription)),
    ))
}

/// GET /api/subscriptions/me/access
pub async fn check_access(
    State(state): State<BillingAppState>,
    LearnerIdentity(user_id): LearnerIdentity,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .check_access_handler()
        .handle(CheckAccessQuery { user_id })
        .await?;
    Ok(Json(result))
}

/// POST /api/subscriptions/me/cancel
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    LearnerIdentity(user_id): LearnerIdentity,
    request: Option<Json<CancelRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let reason = request.and_then(|Json(r)| r.reason);
    let result = state
        .cancel_handler()
        .handle(CancelSubscriptionCommand { user_id, reason })
        .await?;
    Ok(Json(SubscriptionResponse::from(result.subscription)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════════════════

/// Decodes a confirmation body. Undecodable JSON is reported like any other
/// malformed payload so callers always see the same generic rejection.
fn parse_payload(body: &[u8]) -> Result<GatewayPayload, ApiError> {
    serde_json::from_slice(body).map_err(|err| {
        tracing::warn!(error = %err, "Rejected undecodable payment payload");
        ApiError(SubscriptionError::Verification(
            VerificationError::GatewayPayloadMalformed("body"),
        ))
    })
}

#[derive(Debug, Serialize)]
pub struct PaymentConfirmedResponse {
    #[serde(flatten)]
    pub payment: VerifiedPayment,
    pub replayed: bool,
}

/// POST /api/payments/confirm - client-side checkout callback
pub async fn confirm_payment(
    State(state): State<BillingAppState>,
    LearnerIdentity(user_id): LearnerIdentity,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_payload(&body)?;
    tracing::debug!(user_id = %user_id, "Payment confirmation received from client");
    let result = state
        .verify_payment_handler()
        .handle(VerifyPaymentCommand {
            payload,
            source: ConfirmationSource::ClientCallback,
        })
        .await?;

    Ok(Json(PaymentConfirmedResponse {
        payment: result.payment,
        replayed: result.replayed,
    }))
}

/// POST /api/webhooks/payments - server-to-server gateway notification
///
/// Authenticated by the payload signature alone.
pub async fn payment_webhook(
    State(state): State<BillingAppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload = parse_payload(&body)?;
    let result = state
        .verify_payment_handler()
        .handle(VerifyPaymentCommand {
            payload,
            source: ConfirmationSource::Webhook,
        })
        .await?;

    Ok(Json(serde_json::json!({
        "status": if result.replayed { "duplicate" } else { "processed" },
        "payment_id": result.payment.payment_id,
    })))
}
