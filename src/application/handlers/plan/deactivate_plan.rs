//! DeactivatePlanHandler - Admin command to retire a plan version.

use std::sync::Arc;

use crate::domain::foundation::PlanId;
use crate::domain::plan::Plan;
use crate::domain::subscription::SubscriptionError;
use crate::ports::PlanRepository;

#[derive(Debug, Clone)]
pub struct DeactivatePlanCommand {
    pub plan_id: PlanId,
}

/// Hides a plan from active listings. Subscriptions on it are untouched.
pub struct DeactivatePlanHandler {
    plans: Arc<dyn PlanRepository>,
}

impl DeactivatePlanHandler {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self, cmd: DeactivatePlanCommand) -> Result<Plan, SubscriptionError> {
        if !self.plans.deactivate(&cmd.plan_id).await? {
            return Err(SubscriptionError::PlanNotFound(cmd.plan_id));
        }
        tracing::info!(plan_id = %cmd.plan_id, "Plan deactivated");

        self.plans
            .find_by_id(&cmd.plan_id)
            .await?
            .ok_or(SubscriptionError::PlanNotFound(cmd.plan_id))
    }
}
