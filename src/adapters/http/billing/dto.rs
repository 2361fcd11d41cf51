//! HTTP DTOs for the billing API.
//!
//! Request bodies and query strings deserialize into these; domain values
//! are projected into response types before serialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::analytics::{PlanShare, SubscriptionOverview};
use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp};
use crate::domain::plan::{BillingPeriod, Plan};
use crate::domain::subscription::{AuditEntry, BadgeTone, Subscription, SubscriptionStatus};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct ListPlansParams {
    /// Defaults to `true`; pass `false` to include deactivated plans.
    #[serde(default)]
    pub active_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    pub price_minor_units: i64,
    /// ISO-4217; the configured default currency when absent.
    #[serde(default)]
    pub currency: Option<String>,
    pub billing_period: BillingPeriod,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartTrialRequest {
    pub plan_id: PlanId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminCancelRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRequest {
    pub target_status: SubscriptionStatus,
    #[serde(default)]
    pub target_plan_id: Option<PlanId>,
    #[serde(default)]
    pub target_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PauseRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSubscriptionsParams {
    pub status: Option<SubscriptionStatus>,
    pub plan_id: Option<PlanId>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Either an explicit `[from, to)` range or the trailing `days` before `to`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub days: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub id: PlanId,
    pub name: String,
    pub price_minor_units: i64,
    pub currency: String,
    pub billing_period: BillingPeriod,
    pub features: Vec<String>,
    pub active: bool,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id,
            name: plan.name,
            price_minor_units: plan.price_minor_units,
            currency: plan.currency,
            billing_period: plan.billing_period,
            features: plan.features,
            active: plan.active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: SubscriptionId,
    pub user_id: String,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    /// Human label for the status badge.
    pub status_label: &'static str,
    pub status_tone: BadgeTone,
    pub start_date: Timestamp,
    pub current_period_end: Timestamp,
    pub gateway_subscription_ref: Option<String>,
    pub cancelled_at: Option<Timestamp>,
    pub cancel_reason: Option<String>,
    pub version: i64,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id,
            user_id: sub.user_id.to_string(),
            plan_id: sub.plan_id,
            status: sub.status,
            status_label: sub.status.label(),
            status_tone: sub.status.badge_tone(),
            start_date: sub.start_date,
            current_period_end: sub.current_period_end,
            gateway_subscription_ref: sub.gateway_subscription_ref,
            cancelled_at: sub.cancelled_at,
            cancel_reason: sub.cancel_reason,
            version: sub.version,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPageResponse {
    pub items: Vec<SubscriptionResponse>,
    pub total_count: u64,
    pub total_pages: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditHistoryResponse {
    pub subscription_id: SubscriptionId,
    pub entries: Vec<AuditEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewResponse {
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub active_count: u64,
    pub trial_count: u64,
    pub paused_count: u64,
    pub cancelled_count: u64,
    pub expired_count: u64,
    pub mrr: std::collections::BTreeMap<String, i64>,
    pub churn_rate_percent: f64,
    pub cancellations_in_window: u64,
    pub active_at_window_start: u64,
    pub plan_distribution: Vec<PlanShare>,
    pub new_subscriptions: u64,
    pub revenue_in_window: std::collections::BTreeMap<String, i64>,
}

impl From<SubscriptionOverview> for OverviewResponse {
    fn from(overview: SubscriptionOverview) -> Self {
        Self {
            window_start: overview.window.start(),
            window_end: overview.window.end(),
            active_count: overview.active_count,
            trial_count: overview.trial_count,
            paused_count: overview.paused_count,
            cancelled_count: overview.cancelled_count,
            expired_count: overview.expired_count,
            mrr: overview.mrr,
            churn_rate_percent: overview.churn_rate_percent,
            cancellations_in_window: overview.churn.cancellations,
            active_at_window_start: overview.churn.active_at_window_start,
            plan_distribution: overview.plan_distribution,
            new_subscriptions: overview.new_subscriptions,
            revenue_in_window: overview.revenue_in_window,
        }
    }
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
