//! Subscription aggregate.
//!
//! `apply` is the only way a subscription changes state. It never mutates
//! `self`; it returns the next row together with the single audit entry
//! that must be written alongside it.
//!
//! # Design Decisions
//!
//! - **Optimistic versioning**: every transition bumps `version` by one
//! - **Monotonic period**: open periods never move backwards
//! - **Never deleted**: terminal rows are kept for history and analytics

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    AuditEntryId, PlanId, StateMachine, SubscriptionId, Timestamp, UserId,
};

use super::{
    Actor, AdminOverride, AuditEntry, OverrideGuard, SubscriptionError, SubscriptionEvent,
    SubscriptionStatus,
};

/// A learner's subscription record.
///
/// # Invariants
///
/// - at most one open (trial/active/paused) subscription per user
/// - `status` changes only through [`Subscription::apply`]
/// - `current_period_end` is non-decreasing while trial or active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub start_date: Timestamp,
    pub current_period_end: Timestamp,
    /// Recurring-subscription id at the payment gateway, once known.
    pub gateway_subscription_ref: Option<String>,
    pub cancelled_at: Option<Timestamp>,
    pub cancel_reason: Option<String>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Result of a successful `apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub subscription: Subscription,
    pub audit: AuditEntry,
}

impl Subscription {
    /// Opens a trial for `user_id` on `plan_id`.
    ///
    /// Returns the record and its creation audit entry.
    pub fn start_trial(
        id: SubscriptionId,
        user_id: UserId,
        plan_id: PlanId,
        now: Timestamp,
        trial_days: u32,
    ) -> Transition {
        let subscription = Self {
            id,
            user_id: user_id.clone(),
            plan_id,
            status: SubscriptionStatus::Trial,
            start_date: now,
            current_period_end: now.add_days(i64::from(trial_days)),
            gateway_subscription_ref: None,
            cancelled_at: None,
            cancel_reason: None,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let audit = AuditEntry {
            id: AuditEntryId::new(),
            subscription_id: id,
            actor: Actor::User,
            actor_ref: Some(user_id.to_string()),
            action: AuditEntry::TRIAL_STARTED.to_string(),
            reason: None,
            before_status: None,
            after_status: SubscriptionStatus::Trial,
            timestamp: now,
        };
        Transition {
            subscription,
            audit,
        }
    }

    /// True while the learner may use paid features.
    pub fn has_access(&self, now: Timestamp) -> bool {
        self.status.grants_access() && !self.current_period_end.is_before(&now)
    }

    /// True once the trial or paid period has elapsed and no renewal arrived.
    pub fn is_due_for_expiry(&self, now: Timestamp) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Trial | SubscriptionStatus::Active
        ) && self.current_period_end.is_before(&now)
    }

    /// Expiry event matching the current status, if any.
    pub fn expiry_event(&self) -> Option<SubscriptionEvent> {
        match self.status {
            SubscriptionStatus::Trial => Some(SubscriptionEvent::TrialExpired),
            SubscriptionStatus::Active => Some(SubscriptionEvent::PeriodExpired),
            _ => None,
        }
    }

    /// Computes the transition `event` causes at `now`.
    ///
    /// # Errors
    ///
    /// - `IllegalTransition` if the event is not allowed from the current status
    /// - `OverrideRejected` if an admin override violates a guard
    pub fn apply(
        &self,
        event: &SubscriptionEvent,
        now: Timestamp,
    ) -> Result<Transition, SubscriptionError> {
        let mut next = self.clone();

        match event {
            SubscriptionEvent::PaymentVerified {
                plan_id,
                new_period_end,
                gateway_subscription_ref,
            } => {
                self.require(SubscriptionStatus::Active, event)?;
                next.status = SubscriptionStatus::Active;
                next.plan_id = *plan_id;
                next.current_period_end = self.current_period_end.max(*new_period_end);
                if let Some(gateway_ref) = gateway_subscription_ref {
                    next.gateway_subscription_ref = Some(gateway_ref.clone());
                }
            }
            SubscriptionEvent::TrialExpired => {
                if self.status != SubscriptionStatus::Trial || !self.is_due_for_expiry(now) {
                    return Err(self.illegal(event));
                }
                next.status = SubscriptionStatus::Expired;
            }
            SubscriptionEvent::PeriodExpired => {
                if self.status != SubscriptionStatus::Active || !self.is_due_for_expiry(now) {
                    return Err(self.illegal(event));
                }
                next.status = SubscriptionStatus::Expired;
            }
            SubscriptionEvent::UserCancel { reason, .. } => {
                self.require(SubscriptionStatus::Cancelled, event)?;
                next.status = SubscriptionStatus::Cancelled;
                next.cancelled_at = Some(now);
                next.cancel_reason = reason.clone();
            }
            SubscriptionEvent::GatewayPause { .. } => {
                if self.status != SubscriptionStatus::Active {
                    return Err(self.illegal(event));
                }
                next.status = SubscriptionStatus::Paused;
            }
            SubscriptionEvent::AdminOverride(request) => {
                self.apply_override(&mut next, request, now)?;
            }
        }

        next.version = self.version + 1;
        next.updated_at = now;

        let audit = AuditEntry {
            id: AuditEntryId::new(),
            subscription_id: self.id,
            actor: event.actor(),
            actor_ref: event.actor_ref(),
            action: event.name().to_string(),
            reason: event.reason(),
            before_status: Some(self.status),
            after_status: next.status,
            timestamp: now,
        };

        Ok(Transition {
            subscription: next,
            audit,
        })
    }

    fn apply_override(
        &self,
        next: &mut Subscription,
        request: &AdminOverride,
        now: Timestamp,
    ) -> Result<(), SubscriptionError> {
        if request.reason.trim().is_empty() {
            return Err(SubscriptionError::OverrideRejected(
                OverrideGuard::MissingReason,
            ));
        }

        let keeps_open_period = matches!(
            self.status,
            SubscriptionStatus::Trial | SubscriptionStatus::Active
        ) && matches!(
            request.target_status,
            SubscriptionStatus::Trial | SubscriptionStatus::Active
        );
        if let Some(requested) = request.target_end_date {
            if keeps_open_period && requested.is_before(&self.current_period_end) {
                return Err(SubscriptionError::OverrideRejected(
                    OverrideGuard::PeriodEndRegression {
                        current: self.current_period_end,
                        requested,
                    },
                ));
            }
            next.current_period_end = requested;
        }

        if let Some(plan_id) = request.target_plan_id {
            next.plan_id = plan_id;
        }

        next.status = request.target_status;
        if request.target_status == SubscriptionStatus::Cancelled {
            if self.status != SubscriptionStatus::Cancelled {
                next.cancelled_at = Some(now);
            }
            next.cancel_reason = Some(request.reason.trim().to_string());
        } else if request.target_status.is_open() {
            next.cancelled_at = None;
            next.cancel_reason = None;
        }
        Ok(())
    }

    fn require(
        &self,
        target: SubscriptionStatus,
        event: &SubscriptionEvent,
    ) -> Result<(), SubscriptionError> {
        if self.status.can_transition_to(&target) {
            Ok(())
        } else {
            Err(self.illegal(event))
        }
    }

    fn illegal(&self, event: &SubscriptionEvent) -> SubscriptionError {
        SubscriptionError::illegal_transition(self.id, self.status, event.name())
    }
}
