//! Events consumed by the subscription state machine.
//!
//! Organic events come from payments, the scheduler and learners;
//! `AdminOverride` is the only privileged variant.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, Timestamp, UserId};

use super::{Actor, SubscriptionStatus};

/// Input to `Subscription::apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubscriptionEvent {
    /// A verified payment extends the paid period.
    PaymentVerified {
        plan_id: PlanId,
        new_period_end: Timestamp,
        gateway_subscription_ref: Option<String>,
    },

    /// Trial period elapsed without payment.
    TrialExpired,

    /// Paid period elapsed without renewal.
    PeriodExpired,

    /// Learner cancelled; access ends immediately.
    UserCancel { user_id: UserId, reason: Option<String> },

    /// Gateway entered a retry window.
    GatewayPause { reason: Option<String> },

    /// Administrator forced a target state.
    AdminOverride(AdminOverride),
}

/// Privileged force-set request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOverride {
    pub admin_id: UserId,
    pub target_status: SubscriptionStatus,
    pub target_plan_id: Option<PlanId>,
    pub target_end_date: Option<Timestamp>,
    pub reason: String,
}

impl SubscriptionEvent {
    /// Name recorded as the audit action.
    pub fn name(&self) -> &'static str {
        match self {
            SubscriptionEvent::PaymentVerified { .. } => "payment_verified",
            SubscriptionEvent::TrialExpired => "trial_expired",
            SubscriptionEvent::PeriodExpired => "period_expired",
            SubscriptionEvent::UserCancel { .. } => "user_cancel",
            SubscriptionEvent::GatewayPause { .. } => "gateway_pause",
            SubscriptionEvent::AdminOverride(_) => "admin_override",
        }
    }

    pub fn actor(&self) -> Actor {
        match self {
            SubscriptionEvent::UserCancel { .. } => Actor::User,
            SubscriptionEvent::AdminOverride(_) => Actor::Admin,
            _ => Actor::System,
        }
    }

    /// Identity of the human behind the event, if any.
    pub fn actor_ref(&self) -> Option<String> {
        match self {
            SubscriptionEvent::UserCancel { user_id, .. } => Some(user_id.to_string()),
            SubscriptionEvent::AdminOverride(o) => Some(o.admin_id.to_string()),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            SubscriptionEvent::UserCancel { reason, .. }
            | SubscriptionEvent::GatewayPause { reason } => reason.clone(),
            SubscriptionEvent::AdminOverride(o) => Some(o.reason.clone()),
            _ => None,
        }
    }
}
