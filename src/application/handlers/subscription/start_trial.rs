//! StartTrialHandler - Command handler for opening a learner's trial.

use std::sync::Arc;

use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{AuditEntry, Subscription, SubscriptionError};
use crate::ports::{PlanRepository, SubscriptionRepository};

/// Command to start a trial on a plan.
#[derive(Debug, Clone)]
pub struct StartTrialCommand {
    pub user_id: UserId,
    pub plan_id: PlanId,
}

/// Result of a started trial.
#[derive(Debug, Clone)]
pub struct StartTrialResult {
    pub subscription: Subscription,
    pub audit_entry: AuditEntry,
}

/// Handler for signups.
///
/// A user may hold one open subscription; re-subscribing after a terminal
/// state creates a fresh record.
pub struct StartTrialHandler {
    plans: Arc<dyn PlanRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    trial_days: u32,
}

impl StartTrialHandler {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        trial_days: u32,
    ) -> Self {
        Self {
            plans,
            subscriptions,
            trial_days,
        }
    }

    pub async fn handle(&self, cmd: StartTrialCommand) -> Result<StartTrialResult, SubscriptionError> {
        // 1. Plan must exist and still be on sale
        let plan = self
            .plans
            .find_by_id(&cmd.plan_id)
            .await?
            .filter(|p| p.active)
            .ok_or(SubscriptionError::PlanNotFound(cmd.plan_id))?;

        // 2. One open subscription per user
        if self
            .subscriptions
            .find_open_for_user(&cmd.user_id)
            .await?
            .is_some()
        {
            return Err(SubscriptionError::OpenSubscriptionExists(cmd.user_id));
        }

        // 3. Create; the store re-checks the one-open rule atomically
        let created = Subscription::start_trial(
            SubscriptionId::new(),
            cmd.user_id,
            plan.id,
            Timestamp::now(),
            self.trial_days,
        );
        self.subscriptions
            .create(&created.subscription, &created.audit)
            .await?;

        tracing::info!(
            subscription_id = %created.subscription.id,
            user_id = %created.subscription.user_id,
            plan_id = %plan.id,
            period_end = %created.subscription.current_period_end.as_datetime(),
            "Trial started"
        );

        Ok(StartTrialResult {
            subscription: created.subscription,
            audit_entry: created.audit,
        })
    }
}
