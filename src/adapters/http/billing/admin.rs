//! HTTP handlers for admin endpoints. Every handler requires `AdminIdentity`.

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::dto::{
    AdminCancelRequest, AuditHistoryResponse, CreatePlanRequest, ListSubscriptionsParams,
    OverrideRequest, OverviewParams, OverviewResponse, PauseRequest, PlanResponse,
    SubscriptionPageResponse, SubscriptionResponse,
};
use super::error::ApiError;
use super::state::BillingAppState;
use crate::adapters::http::middleware::AdminIdentity;
use crate::application::handlers::{
    AdminCancelCommand, AuditHistoryQuery, ComputeOverviewQuery, CreatePlanCommand,
    DeactivatePlanCommand, ListSubscriptionsQuery, OverrideSubscriptionCommand,
    PauseSubscriptionCommand, RunExpirySweepCommand,
};
use crate::application::handlers::scheduler::SweepReportView;
use crate::domain::analytics::ReportingWindow;
use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp};
use crate::ports::{PageRequest, SubscriptionFilter};

const DEFAULT_OVERVIEW_DAYS: u32 = 30;

// ════════════════════════════════════════════════════════════════════════════════
// Plan administration
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/admin/plans
pub async fn create_plan(
    State(state): State<BillingAppState>,
    AdminIdentity(admin_id): AdminIdentity,
    Json(request): Json<CreatePlanRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .create_plan_handler()
        .handle(CreatePlanCommand {
            name: request.name,
            price_minor_units: request.price_minor_units,
            currency: request
                .currency
                .unwrap_or_else(|| state.settings.default_currency.clone()),
            billing_period: request.billing_period,
            features: request.features,
        })
        .await?;

    tracing::debug!(plan_id = %plan.id, admin_id = %admin_id, "Admin plan request served");
    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

/// POST /api/admin/plans/:plan_id/deactivate
pub async fn deactivate_plan(
    State(state): State<BillingAppState>,
    AdminIdentity(admin_id): AdminIdentity,
    Path(plan_id): Path<PlanId>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .deactivate_plan_handler()
        .handle(DeactivatePlanCommand { plan_id })
        .await?;

    tracing::debug!(plan_id = %plan_id, admin_id = %admin_id, "Admin plan request served");
    Ok(Json(PlanResponse::from(plan)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/subscriptions
pub async fn list_subscriptions(
    State(state): State<BillingAppState>,
    AdminIdentity(_admin_id): AdminIdentity,
    Query(params): Query<ListSubscriptionsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = PageRequest::default();
    let page = state
        .list_subscriptions_handler()
        .handle(ListSubscriptionsQuery {
            filter: SubscriptionFilter {
                status: params.status,
                plan_id: params.plan_id,
                search: params.search,
            },
            page: params.page.unwrap_or(defaults.page()),
            limit: params.limit.unwrap_or(defaults.limit()),
        })
        .await?;

    Ok(Json(SubscriptionPageResponse {
        items: page
            .items
            .into_iter()
            .map(SubscriptionResponse::from)
            .collect(),
        total_count: page.total_count,
        total_pages: page.total_pages,
        page: page.page,
        limit: page.limit,
    }))
}

/// POST /api/admin/subscriptions/:id/override
pub async fn override_subscription(
    State(state): State<BillingAppState>,
    AdminIdentity(admin_id): AdminIdentity,
    Path(subscription_id): Path<SubscriptionId>,
    Json(request): Json<OverrideRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .override_handler()
        .handle(OverrideSubscriptionCommand {
            subscription_id,
            admin_id,
            target_status: request.target_status,
            target_plan_id: request.target_plan_id,
            target_end_date: request.target_end_date.map(Timestamp::from_datetime),
            reason: request.reason,
        })
        .await?;
    Ok(Json(SubscriptionResponse::from(result.subscription)))
}

/// POST /api/admin/subscriptions/:id/cancel
pub async fn admin_cancel(
    State(state): State<BillingAppState>,
    AdminIdentity(admin_id): AdminIdentity,
    Path(subscription_id): Path<SubscriptionId>,
    Json(request): Json<AdminCancelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .admin_cancel_handler()
        .handle(AdminCancelCommand {
            subscription_id,
            admin_id,
            reason: request.reason,
        })
        .await?;
    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// POST /api/admin/subscriptions/:id/pause - relays a gateway pause notice
pub async fn pause_subscription(
    State(state): State<BillingAppState>,
    AdminIdentity(_admin_id): AdminIdentity,
    Path(subscription_id): Path<SubscriptionId>,
    request: Option<Json<PauseRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .pause_handler()
        .handle(PauseSubscriptionCommand {
            subscription_id,
            reason: request.and_then(|Json(r)| r.reason),
        })
        .await?;
    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// GET /api/admin/subscriptions/:id/audit
pub async fn audit_history(
    State(state): State<BillingAppState>,
    AdminIdentity(_admin_id): AdminIdentity,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .audit_history_handler()
        .handle(AuditHistoryQuery { subscription_id })
        .await?;
    Ok(Json(AuditHistoryResponse {
        subscription_id,
        entries,
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Analytics & scheduler
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/analytics/overview
pub async fn analytics_overview(
    State(state): State<BillingAppState>,
    AdminIdentity(_admin_id): AdminIdentity,
    Query(params): Query<OverviewParams>,
) -> Result<impl IntoResponse, ApiError> {
    let end = params
        .to
        .map(Timestamp::from_datetime)
        .unwrap_or_else(Timestamp::now);
    let window = match params.from {
        Some(from) => ReportingWindow::new(Timestamp::from_datetime(from), end)?,
        None => ReportingWindow::trailing_days(end, params.days.unwrap_or(DEFAULT_OVERVIEW_DAYS))?,
    };

    let overview = state
        .overview_handler()
        .handle(ComputeOverviewQuery { window })
        .await?;
    Ok(Json(OverviewResponse::from(overview)))
}

/// POST /api/admin/scheduler/sweep - lets an external cron drive expiry
pub async fn run_sweep(
    State(state): State<BillingAppState>,
    AdminIdentity(admin_id): AdminIdentity,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(admin_id = %admin_id, "Manual expiry sweep requested");
    let report = state
        .sweep_handler()
        .handle(RunExpirySweepCommand {
            now: Timestamp::now(),
        })
        .await?;
    Ok(Json(SweepReportView::from(&report)))
}
