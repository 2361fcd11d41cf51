//! OverrideSubscriptionHandler - Admin force-set of status, plan or end date.
//!
//! The override is an ordinary `AdminOverride` event run through the
//! transition executor, so it is versioned and audited like any other
//! transition.

use std::sync::Arc;

use crate::domain::foundation::{PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{
    AdminOverride, AuditEntry, OverrideGuard, Subscription, SubscriptionError,
    SubscriptionEvent, SubscriptionStatus,
};
use crate::ports::{PlanRepository, SubscriptionRepository};

use super::super::subscription::{Decision, TransitionExecutor};

#[derive(Debug, Clone)]
pub struct OverrideSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub admin_id: UserId,
    pub target_status: SubscriptionStatus,
    pub target_plan_id: Option<PlanId>,
    pub target_end_date: Option<Timestamp>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct OverrideSubscriptionResult {
    pub subscription: Subscription,
    pub audit_entry: AuditEntry,
}

pub struct OverrideSubscriptionHandler {
    plans: Arc<dyn PlanRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    executor: TransitionExecutor,
}

impl OverrideSubscriptionHandler {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            executor: TransitionExecutor::new(subscriptions.clone()),
            plans,
            subscriptions,
        }
    }

    /// # Errors
    ///
    /// - `OverrideRejected` naming the violated guard
    /// - `SubscriptionNotFound`
    /// - `ConcurrentModification` if retries are exhausted
    pub async fn handle(
        &self,
        cmd: OverrideSubscriptionCommand,
    ) -> Result<OverrideSubscriptionResult, SubscriptionError> {
        let reason = cmd.reason.trim().to_string();
        if reason.is_empty() {
            return Err(SubscriptionError::OverrideRejected(
                OverrideGuard::MissingReason,
            ));
        }

        if let Some(plan_id) = cmd.target_plan_id {
            if self.plans.find_by_id(&plan_id).await?.is_none() {
                return Err(SubscriptionError::OverrideRejected(
                    OverrideGuard::UnknownPlan(plan_id),
                ));
            }
        }

        let subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound(cmd.subscription_id))?;

        if cmd.target_status.is_open() && !subscription.status.is_open() {
            if let Some(other) = self
                .subscriptions
                .find_open_for_user(&subscription.user_id)
                .await?
            {
                if other.id != subscription.id {
                    return Err(SubscriptionError::OverrideRejected(
                        OverrideGuard::OpenSubscriptionExists,
                    ));
                }
            }
        }

        let event = SubscriptionEvent::AdminOverride(AdminOverride {
            admin_id: cmd.admin_id.clone(),
            target_status: cmd.target_status,
            target_plan_id: cmd.target_plan_id,
            target_end_date: cmd.target_end_date,
            reason: reason.clone(),
        });

        let transition = self
            .executor
            .execute(cmd.subscription_id, Timestamp::now(), |_, _| {
                Ok(Decision::apply(event.clone()))
            })
            .await
            .map_err(|err| match err {
                SubscriptionError::OpenSubscriptionExists(_) => {
                    SubscriptionError::OverrideRejected(OverrideGuard::OpenSubscriptionExists)
                }
                other => other,
            })?
            .into_transition()?;

        tracing::info!(
            subscription_id = %cmd.subscription_id,
            admin_id = %cmd.admin_id,
            target = %cmd.target_status,
            reason = %reason,
            "Admin override applied"
        );

        Ok(OverrideSubscriptionResult {
            subscription: transition.subscription,
            audit_entry: transition.audit,
        })
    }
}
