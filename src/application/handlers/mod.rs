//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations,
//! grouped by area.

pub mod admin;
pub mod analytics;
pub mod payment;
pub mod plan;
pub mod scheduler;
pub mod subscription;

pub use admin::{
    AdminCancelCommand, AdminCancelHandler, AuditHistoryHandler, AuditHistoryQuery,
    ListSubscriptionsHandler, ListSubscriptionsQuery, OverrideSubscriptionCommand,
    OverrideSubscriptionHandler, OverrideSubscriptionResult,
};
pub use analytics::{ComputeOverviewHandler, ComputeOverviewQuery};
pub use payment::{
    ConfirmationSource, VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult,
};
pub use plan::{
    CreatePlanCommand, CreatePlanHandler, DeactivatePlanCommand, DeactivatePlanHandler,
    GetPlanHandler, GetPlanQuery, ListPlansHandler, ListPlansQuery,
};
pub use scheduler::{ExpirySweepHandler, RunExpirySweepCommand, SweepFailure, SweepReport};
pub use subscription::{
    AccessSummary, CancelSubscriptionCommand, CancelSubscriptionHandler,
    CancelSubscriptionResult, CheckAccessHandler, CheckAccessQuery, CheckAccessResult,
    Decision, ExecutionOutcome, PauseSubscriptionCommand, PauseSubscriptionHandler,
    StartTrialCommand, StartTrialHandler, StartTrialResult, TransitionExecutor,
    MAX_TRANSITION_ATTEMPTS,
};

/// Shared fixtures for handler tests.
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::adapters::memory::InMemoryBillingStore;
    use crate::domain::foundation::{
        AuditEntryId, PlanId, SubscriptionId, Timestamp, UserId,
    };
    use crate::domain::payment::{GatewayPayload, PaymentSignatureVerifier};
    use crate::domain::plan::{BillingPeriod, Plan};
    use crate::domain::subscription::{
        Actor, AuditEntry, Subscription, SubscriptionStatus,
    };
    use crate::ports::{
        CommitOutcome, PlanRepository, SubscriptionRepository, TransitionCommit,
    };

    pub const TEST_SECRET: &str = "rzp_test_secret_handlers";

    pub fn learner() -> UserId {
        UserId::new("learner-1").unwrap()
    }

    pub fn admin() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    pub fn verifier() -> Arc<PaymentSignatureVerifier> {
        Arc::new(PaymentSignatureVerifier::new(TEST_SECRET))
    }

    /// Monthly INR plan at `price`.
    pub async fn seed_plan(store: &Arc<InMemoryBillingStore>, price: i64) -> Plan {
        let plan = Plan::new(
            PlanId::new(),
            format!("Monthly {}", price),
            price,
            "INR",
            BillingPeriod::Monthly,
            vec!["All subjects".to_string()],
            Timestamp::now(),
        )
        .unwrap();
        store.insert(&plan).await.unwrap();
        plan
    }

    /// Seven-day trial for `learner()` on a fresh plan.
    pub async fn seed_trial(store: &Arc<InMemoryBillingStore>) -> Subscription {
        let plan = seed_plan(store, 29900).await;
        let created = Subscription::start_trial(
            SubscriptionId::new(),
            learner(),
            plan.id,
            Timestamp::now(),
            7,
        );
        store
            .create(&created.subscription, &created.audit)
            .await
            .unwrap();
        created.subscription
    }

    pub async fn fetch(store: &Arc<InMemoryBillingStore>, id: &SubscriptionId) -> Subscription {
        SubscriptionRepository::find_by_id(store.as_ref(), id)
            .await
            .unwrap()
            .unwrap()
    }

    /// Forces a status for test setup, bypassing the state machine.
    pub async fn set_status(
        store: &Arc<InMemoryBillingStore>,
        sub: &Subscription,
        status: SubscriptionStatus,
    ) -> Subscription {
        rewrite(store, &sub.id, |s| s.status = status).await
    }

    /// Applies `edit` to the stored row and writes it back with a setup audit entry.
    pub async fn rewrite<F>(
        store: &Arc<InMemoryBillingStore>,
        id: &SubscriptionId,
        edit: F,
    ) -> Subscription
    where
        F: FnOnce(&mut Subscription),
    {
        let current = fetch(store, id).await;
        let mut next = current.clone();
        edit(&mut next);
        next.version = current.version + 1;
        let audit = AuditEntry {
            id: AuditEntryId::new(),
            subscription_id: current.id,
            actor: Actor::System,
            actor_ref: None,
            action: "test_setup".to_string(),
            reason: None,
            before_status: Some(current.status),
            after_status: next.status,
            timestamp: Timestamp::now(),
        };
        let outcome = store
            .commit_transition(TransitionCommit {
                subscription: next.clone(),
                expected_version: current.version,
                audit_entry: audit,
                payment: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::Committed);
        next
    }

    /// Correctly signed confirmation payload.
    pub fn payload_for(
        subscription_id: &SubscriptionId,
        plan_id: &PlanId,
        order_ref: &str,
        payment_ref: &str,
    ) -> GatewayPayload {
        GatewayPayload {
            gateway_order_ref: Some(order_ref.to_string()),
            gateway_payment_ref: Some(payment_ref.to_string()),
            signature: Some(verifier().sign(order_ref, payment_ref).unwrap()),
            subscription_id: Some(subscription_id.to_string()),
            plan_id: Some(plan_id.to_string()),
            gateway_subscription_ref: None,
        }
    }
}
