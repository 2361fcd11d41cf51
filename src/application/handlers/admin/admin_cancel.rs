//! AdminCancelHandler - Admin cancellation with a mandatory reason.

use std::sync::Arc;

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{
    AdminOverride, OverrideGuard, Subscription, SubscriptionError, SubscriptionEvent,
    SubscriptionStatus,
};
use crate::ports::SubscriptionRepository;

use super::super::subscription::{Decision, TransitionExecutor};

#[derive(Debug, Clone)]
pub struct AdminCancelCommand {
    pub subscription_id: SubscriptionId,
    pub admin_id: UserId,
    pub reason: String,
}

/// Cancels any non-terminal subscription, including paused ones.
///
/// Routed as an `AdminOverride` targeting `cancelled`.
pub struct AdminCancelHandler {
    executor: TransitionExecutor,
}

impl AdminCancelHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            executor: TransitionExecutor::new(subscriptions),
        }
    }

    pub async fn handle(&self, cmd: AdminCancelCommand) -> Result<Subscription, SubscriptionError> {
        let reason = cmd.reason.trim().to_string();
        if reason.is_empty() {
            return Err(SubscriptionError::OverrideRejected(
                OverrideGuard::MissingReason,
            ));
        }

        let event = SubscriptionEvent::AdminOverride(AdminOverride {
            admin_id: cmd.admin_id.clone(),
            target_status: SubscriptionStatus::Cancelled,
            target_plan_id: None,
            target_end_date: None,
            reason: reason.clone(),
        });

        let transition = self
            .executor
            .execute(cmd.subscription_id, Timestamp::now(), |current, _| {
                if !current.status.is_open() {
                    return Err(SubscriptionError::illegal_transition(
                        current.id,
                        current.status,
                        "admin_cancel",
                    ));
                }
                Ok(Decision::apply(event.clone()))
            })
            .await?
            .into_transition()?;

        tracing::info!(
            subscription_id = %cmd.subscription_id,
            admin_id = %cmd.admin_id,
            reason = %reason,
            "Subscription cancelled by admin"
        );

        Ok(transition.subscription)
    }
}
