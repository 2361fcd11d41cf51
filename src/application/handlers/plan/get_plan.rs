//! GetPlanHandler - Query handler for a single plan.

use std::sync::Arc;

use crate::domain::foundation::PlanId;
use crate::domain::plan::Plan;
use crate::domain::subscription::SubscriptionError;
use crate::ports::PlanRepository;

#[derive(Debug, Clone)]
pub struct GetPlanQuery {
    pub plan_id: PlanId,
}

/// Resolves a plan by id. Deactivated plans still resolve so existing
/// subscriptions keep their referent.
pub struct GetPlanHandler {
    plans: Arc<dyn PlanRepository>,
}

impl GetPlanHandler {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self, query: GetPlanQuery) -> Result<Plan, SubscriptionError> {
        self.plans
            .find_by_id(&query.plan_id)
            .await?
            .ok_or(SubscriptionError::PlanNotFound(query.plan_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::application::handlers::test_support::seed_plan;

    #[tokio::test]
    async fn returns_deactivated_plan() {
        let store = Arc::new(InMemoryBillingStore::new());
        let plan = seed_plan(&store, 299).await;
        store.deactivate(&plan.id).await.unwrap();

        let found = GetPlanHandler::new(store)
            .handle(GetPlanQuery { plan_id: plan.id })
            .await
            .unwrap();

        assert_eq!(found.id, plan.id);
        assert!(!found.active);
    }

    #[tokio::test]
    async fn unknown_plan_is_not_found() {
        let store = Arc::new(InMemoryBillingStore::new());
        let missing = PlanId::new();

        let result = GetPlanHandler::new(store)
            .handle(GetPlanQuery { plan_id: missing })
            .await;

        assert_eq!(result, Err(SubscriptionError::PlanNotFound(missing)));
    }
}
