//! ComputeOverviewHandler - Query handler for the admin dashboard rollup.

use std::sync::Arc;

use crate::domain::analytics::{compute_overview, ReportingWindow, SubscriptionOverview};
use crate::domain::subscription::SubscriptionError;
use crate::ports::{AuditLog, PaymentRepository, PlanRepository, SubscriptionReader};

#[derive(Debug, Clone, Copy)]
pub struct ComputeOverviewQuery {
    pub window: ReportingWindow,
}

/// Loads history through the read ports and delegates to the pure
/// `compute_overview`. Never writes.
pub struct ComputeOverviewHandler {
    plans: Arc<dyn PlanRepository>,
    subscriptions: Arc<dyn SubscriptionReader>,
    payments: Arc<dyn PaymentRepository>,
    audit_log: Arc<dyn AuditLog>,
}

impl ComputeOverviewHandler {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionReader>,
        payments: Arc<dyn PaymentRepository>,
        audit_log: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            plans,
            subscriptions,
            payments,
            audit_log,
        }
    }

    pub async fn handle(
        &self,
        query: ComputeOverviewQuery,
    ) -> Result<SubscriptionOverview, SubscriptionError> {
        let window = query.window;
        let plans = self.plans.list(false).await?;
        let subscriptions = self.subscriptions.all().await?;
        let audit = self.audit_log.entries_until(window.end()).await?;
        let payments = self
            .payments
            .list_created_between(window.start(), window.end())
            .await?;

        Ok(compute_overview(
            window,
            &subscriptions,
            &plans,
            &audit,
            &payments,
        ))
    }
}
