//! CreatePlanHandler - Admin command to append a plan version.

use std::sync::Arc;

use crate::domain::foundation::{PlanId, Timestamp};
use crate::domain::plan::{BillingPeriod, Plan};
use crate::domain::subscription::SubscriptionError;
use crate::ports::PlanRepository;

#[derive(Debug, Clone)]
pub struct CreatePlanCommand {
    pub name: String,
    pub price_minor_units: i64,
    pub currency: String,
    pub billing_period: BillingPeriod,
    pub features: Vec<String>,
}

/// Appends a new plan. There is no update; a price change is a new plan.
pub struct CreatePlanHandler {
    plans: Arc<dyn PlanRepository>,
}

impl CreatePlanHandler {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self, cmd: CreatePlanCommand) -> Result<Plan, SubscriptionError> {
        let plan = Plan::new(
            PlanId::new(),
            cmd.name,
            cmd.price_minor_units,
            cmd.currency,
            cmd.billing_period,
            cmd.features,
            Timestamp::now(),
        )?;

        self.plans.insert(&plan).await?;

        tracing::info!(
            plan_id = %plan.id,
            name = %plan.name,
            price = plan.price_minor_units,
            currency = %plan.currency,
            billing_period = %plan.billing_period,
            "Plan created"
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;

    fn cmd(price: i64, currency: &str) -> CreatePlanCommand {
        CreatePlanCommand {
            name: "Yearly Scholar".to_string(),
            price_minor_units: price,
            currency: currency.to_string(),
            billing_period: BillingPeriod::Yearly,
            features: vec!["Live doubt sessions".to_string()],
        }
    }

    #[tokio::test]
    async fn creates_active_plan() {
        let store = Arc::new(InMemoryBillingStore::new());

        let plan = CreatePlanHandler::new(store.clone())
            .handle(cmd(239900, "inr"))
            .await
            .unwrap();

        assert!(plan.active);
        assert_eq!(plan.currency, "INR");
        assert_eq!(store.list(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_invalid_currency() {
        let store = Arc::new(InMemoryBillingStore::new());

        let err = CreatePlanHandler::new(store.clone())
            .handle(cmd(100, "rupees"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubscriptionError::ValidationFailed { ref field, .. } if field == "currency"
        ));
        assert!(store.list(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_price_beyond_limit() {
        let store = Arc::new(InMemoryBillingStore::new());

        let err = CreatePlanHandler::new(store.clone())
            .handle(cmd(crate::domain::plan::MAX_PRICE_MINOR_UNITS + 1, "INR"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubscriptionError::ValidationFailed { ref field, .. } if field == "price_minor_units"
        ));
        assert!(store.list(false).await.unwrap().is_empty());
    }
}
