//! ListPlansHandler - Query handler for the pricing page and admin catalog.

use std::sync::Arc;

use crate::domain::plan::Plan;
use crate::domain::subscription::SubscriptionError;
use crate::ports::PlanRepository;

#[derive(Debug, Clone, Copy)]
pub struct ListPlansQuery {
    pub active_only: bool,
}

pub struct ListPlansHandler {
    plans: Arc<dyn PlanRepository>,
}

impl ListPlansHandler {
    pub fn new(plans: Arc<dyn PlanRepository>) -> Self {
        Self { plans }
    }

    pub async fn handle(&self, query: ListPlansQuery) -> Result<Vec<Plan>, SubscriptionError> {
        Ok(self.plans.list(query.active_only).await?)
    }
}
