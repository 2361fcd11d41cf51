//! PauseSubscriptionHandler - Gateway retry window.

use std::sync::Arc;

use crate::domain::foundation::{SubscriptionId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionError, SubscriptionEvent};
use crate::ports::SubscriptionRepository;

use super::{Decision, TransitionExecutor};

#[derive(Debug, Clone)]
pub struct PauseSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub reason: Option<String>,
}

/// Moves an active subscription into `paused` while the gateway retries.
pub struct PauseSubscriptionHandler {
    executor: TransitionExecutor,
}

impl PauseSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self {
            executor: TransitionExecutor::new(subscriptions),
        }
    }

    pub async fn handle(
        &self,
        cmd: PauseSubscriptionCommand,
    ) -> Result<Subscription, SubscriptionError> {
        let event = SubscriptionEvent::GatewayPause { reason: cmd.reason };
        let transition = self
            .executor
            .execute(cmd.subscription_id, Timestamp::now(), |_, _| {
                Ok(Decision::apply(event.clone()))
            })
            .await?
            .into_transition()?;
        Ok(transition.subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::application::handlers::test_support::{seed_trial, set_status};
    use crate::domain::subscription::SubscriptionStatus;
    use crate::ports::AuditLog;

    #[tokio::test]
    async fn pauses_active_subscription() {
        let store = Arc::new(InMemoryBillingStore::new());
        let sub = seed_trial(&store).await;
        set_status(&store, &sub, SubscriptionStatus::Active).await;

        let paused = PauseSubscriptionHandler::new(store.clone())
            .handle(PauseSubscriptionCommand {
                subscription_id: sub.id,
                reason: Some("card declined, retrying".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(paused.status, SubscriptionStatus::Paused);
        assert!(!paused.has_access(Timestamp::now()));
        let history = store.history(&sub.id).await.unwrap();
        assert_eq!(history.last().unwrap().action, "gateway_pause");
    }

    #[tokio::test]
    async fn trial_cannot_be_paused() {
        let store = Arc::new(InMemoryBillingStore::new());
        let sub = seed_trial(&store).await;

        let result = PauseSubscriptionHandler::new(store)
            .handle(PauseSubscriptionCommand {
                subscription_id: sub.id,
                reason: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(SubscriptionError::IllegalTransition { .. })
        ));
    }
}
