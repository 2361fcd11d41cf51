//! Shared application state for the billing API.

use std::sync::Arc;

use sqlx::PgPool;

use crate::adapters::memory::InMemoryBillingStore;
use crate::adapters::postgres::{
    PostgresAuditLog, PostgresPaymentRepository, PostgresPlanRepository,
    PostgresSubscriptionReader, PostgresSubscriptionRepository,
};
use crate::application::handlers::{
    AdminCancelHandler, AuditHistoryHandler, CancelSubscriptionHandler, CheckAccessHandler,
    ComputeOverviewHandler, CreatePlanHandler, DeactivatePlanHandler, ExpirySweepHandler,
    GetPlanHandler, ListPlansHandler, ListSubscriptionsHandler, OverrideSubscriptionHandler,
    PauseSubscriptionHandler, StartTrialHandler, VerifyPaymentHandler,
};
use crate::domain::payment::PaymentSignatureVerifier;
use crate::ports::{
    AuditLog, PaymentRepository, PlanRepository, SubscriptionReader, SubscriptionRepository,
};

/// Lifecycle settings the handlers need at request time.
#[derive(Debug, Clone)]
pub struct BillingSettings {
    pub trial_days: u32,
    pub sweep_batch_size: u32,
    pub default_currency: String,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            trial_days: 7,
            sweep_batch_size: 100,
            default_currency: "INR".to_string(),
        }
    }
}

/// Cloned into every request; dependencies are Arc-wrapped ports.
#[derive(Clone)]
pub struct BillingAppState {
    pub plans: Arc<dyn PlanRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub subscription_reader: Arc<dyn SubscriptionReader>,
    pub payments: Arc<dyn PaymentRepository>,
    pub audit_log: Arc<dyn AuditLog>,
    pub verifier: Arc<PaymentSignatureVerifier>,
    pub settings: BillingSettings,
}

impl BillingAppState {
    /// Every port served by one in-memory store.
    pub fn in_memory(
        store: Arc<InMemoryBillingStore>,
        verifier: Arc<PaymentSignatureVerifier>,
        settings: BillingSettings,
    ) -> Self {
        Self {
            plans: store.clone(),
            subscriptions: store.clone(),
            subscription_reader: store.clone(),
            payments: store.clone(),
            audit_log: store,
            verifier,
            settings,
        }
    }

    /// Every port backed by PostgreSQL through one pool.
    pub fn postgres(
        pool: PgPool,
        verifier: Arc<PaymentSignatureVerifier>,
        settings: BillingSettings,
    ) -> Self {
        Self {
            plans: Arc::new(PostgresPlanRepository::new(pool.clone())),
            subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
            subscription_reader: Arc::new(PostgresSubscriptionReader::new(pool.clone())),
            payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
            audit_log: Arc::new(PostgresAuditLog::new(pool)),
            verifier,
            settings,
        }
    }

    pub fn list_plans_handler(&self) -> ListPlansHandler {
        ListPlansHandler::new(self.plans.clone())
    }

    pub fn get_plan_handler(&self) -> GetPlanHandler {
        GetPlanHandler::new(self.plans.clone())
    }

    pub fn create_plan_handler(&self) -> CreatePlanHandler {
        CreatePlanHandler::new(self.plans.clone())
    }

    pub fn deactivate_plan_handler(&self) -> DeactivatePlanHandler {
        DeactivatePlanHandler::new(self.plans.clone())
    }

    pub fn start_trial_handler(&self) -> StartTrialHandler {
        StartTrialHandler::new(
            self.plans.clone(),
            self.subscriptions.clone(),
            self.settings.trial_days,
        )
    }

    pub fn check_access_handler(&self) -> CheckAccessHandler {
        CheckAccessHandler::new(self.subscriptions.clone())
    }

    pub fn cancel_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.subscriptions.clone())
    }

    pub fn pause_handler(&self) -> PauseSubscriptionHandler {
        PauseSubscriptionHandler::new(self.subscriptions.clone())
    }

    pub fn verify_payment_handler(&self) -> VerifyPaymentHandler {
        VerifyPaymentHandler::new(
            self.plans.clone(),
            self.subscriptions.clone(),
            self.payments.clone(),
            self.verifier.clone(),
        )
    }

    pub fn override_handler(&self) -> OverrideSubscriptionHandler {
        OverrideSubscriptionHandler::new(self.plans.clone(), self.subscriptions.clone())
    }

    pub fn admin_cancel_handler(&self) -> AdminCancelHandler {
        AdminCancelHandler::new(self.subscriptions.clone())
    }

    pub fn audit_history_handler(&self) -> AuditHistoryHandler {
        AuditHistoryHandler::new(self.subscriptions.clone(), self.audit_log.clone())
    }

    pub fn list_subscriptions_handler(&self) -> ListSubscriptionsHandler {
        ListSubscriptionsHandler::new(self.subscription_reader.clone())
    }

    pub fn overview_handler(&self) -> ComputeOverviewHandler {
        ComputeOverviewHandler::new(
            self.plans.clone(),
            self.subscription_reader.clone(),
            self.payments.clone(),
            self.audit_log.clone(),
        )
    }

    pub fn sweep_handler(&self) -> ExpirySweepHandler {
        ExpirySweepHandler::new(self.subscriptions.clone(), self.settings.sweep_batch_size)
    }
}
