//! CancelSubscriptionHandler - Command handler for learner cancellation.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{AuditEntry, Subscription, SubscriptionError, SubscriptionEvent};
use crate::ports::SubscriptionRepository;

use super::{Decision, TransitionExecutor};

/// Command to cancel the learner's open subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub user_id: UserId,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription: Subscription,
    pub audit_entry: AuditEntry,
}

/// Handler for learner-initiated cancellation.
///
/// Access ends immediately, regardless of time left in the period.
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    executor: TransitionExecutor,
}

impl CancelSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            executor: TransitionExecutor::new(subscriptions.clone()),
            subscriptions,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, SubscriptionError> {
        let subscription = self
            .subscriptions
            .find_open_for_user(&cmd.user_id)
            .await?
            .ok_or_else(|| SubscriptionError::NoSubscriptionForUser(cmd.user_id.clone()))?;

        let reason = cmd
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let event = SubscriptionEvent::UserCancel {
            user_id: cmd.user_id,
            reason,
        };

        let transition = self
            .executor
            .execute(subscription.id, Timestamp::now(), |_, _| {
                Ok(Decision::apply(event.clone()))
            })
            .await?
            .into_transition()?;

        Ok(CancelSubscriptionResult {
            subscription: transition.subscription,
            audit_entry: transition.audit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::application::handlers::test_support::{learner, seed_trial, set_status};
    use crate::domain::subscription::{Actor, SubscriptionStatus};

    #[tokio::test]
    async fn cancels_trial_and_records_reason() {
        let store = Arc::new(InMemoryBillingStore::new());
        seed_trial(&store).await;
        let handler = CancelSubscriptionHandler::new(store.clone());

        let result = handler
            .handle(CancelSubscriptionCommand {
                user_id: learner(),
                reason: Some("  switching schools ".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(result.subscription.status, SubscriptionStatus::Cancelled);
        assert_eq!(
            result.subscription.cancel_reason.as_deref(),
            Some("switching schools")
        );
        assert_eq!(result.audit_entry.actor, Actor::User);
        assert!(!result.subscription.has_access(Timestamp::now()));
    }

    #[tokio::test]
    async fn fails_without_open_subscription() {
        let store = Arc::new(InMemoryBillingStore::new());
        let handler = CancelSubscriptionHandler::new(store);

        let err = handler
            .handle(CancelSubscriptionCommand {
                user_id: learner(),
                reason: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err, SubscriptionError::NoSubscriptionForUser(learner()));
    }

    #[tokio::test]
    async fn paused_subscription_cannot_be_cancelled_by_learner() {
        let store = Arc::new(InMemoryBillingStore::new());
        let sub = seed_trial(&store).await;
        set_status(&store, &sub, SubscriptionStatus::Paused).await;
        let handler = CancelSubscriptionHandler::new(store);

        let err = handler
            .handle(CancelSubscriptionCommand {
                user_id: learner(),
                reason: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::IllegalTransition { .. }));
    }
}
