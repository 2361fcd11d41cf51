//! CheckAccessHandler - Query handler for "can this learner use paid features".

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{BadgeTone, SubscriptionError, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub user_id: UserId,
}

/// Display-ready summary of the subscription that decided access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessSummary {
    pub subscription_id: SubscriptionId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub label: &'static str,
    pub tone: BadgeTone,
    pub current_period_end: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckAccessResult {
    pub user_id: UserId,
    pub has_access: bool,
    /// Open subscription if any, otherwise the most recent one.
    pub subscription: Option<AccessSummary>,
}

/// Handler for access checks.
///
/// No subscription means no access.
pub struct CheckAccessHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl CheckAccessHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(&self, query: CheckAccessQuery) -> Result<CheckAccessResult, SubscriptionError> {
        let current = match self.subscriptions.find_open_for_user(&query.user_id).await? {
            Some(open) => Some(open),
            None => self.subscriptions.find_latest_for_user(&query.user_id).await?,
        };
        let now = Timestamp::now();

        Ok(CheckAccessResult {
            has_access: current.as_ref().map(|s| s.has_access(now)).unwrap_or(false),
            subscription: current.map(|s| AccessSummary {
                subscription_id: s.id,
                plan_id: s.plan_id,
                status: s.status,
                label: s.status.label(),
                tone: s.status.badge_tone(),
                current_period_end: s.current_period_end,
            }),
            user_id: query.user_id,
        })
    }
}
