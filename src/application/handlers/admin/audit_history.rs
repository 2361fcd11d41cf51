//! AuditHistoryHandler - Query handler for a subscription's audit trail.

use std::sync::Arc;

use crate::domain::foundation::SubscriptionId;
use crate::domain::subscription::{AuditEntry, SubscriptionError};
use crate::ports::{AuditLog, SubscriptionRepository};

#[derive(Debug, Clone)]
pub struct AuditHistoryQuery {
    pub subscription_id: SubscriptionId,
}

/// Returns entries oldest first.
pub struct AuditHistoryHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    audit_log: Arc<dyn AuditLog>,
}

impl AuditHistoryHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        audit_log: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            subscriptions,
            audit_log,
        }
    }

    pub async fn handle(&self, query: AuditHistoryQuery) -> Result<Vec<AuditEntry>, SubscriptionError> {
        if self
            .subscriptions
            .find_by_id(&query.subscription_id)
            .await?
            .is_none()
        {
            return Err(SubscriptionError::SubscriptionNotFound(query.subscription_id));
        }
        Ok(self.audit_log.history(&query.subscription_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::application::handlers::subscription::{
        CancelSubscriptionCommand, CancelSubscriptionHandler,
    };
    use crate::application::handlers::test_support::{learner, seed_trial};
    use crate::domain::subscription::SubscriptionStatus;

    #[tokio::test]
    async fn returns_entries_in_chronological_order() {
        let store = Arc::new(InMemoryBillingStore::new());
        let sub = seed_trial(&store).await;
        CancelSubscriptionHandler::new(store.clone())
            .handle(CancelSubscriptionCommand {
                user_id: learner(),
                reason: None,
            })
            .await
            .unwrap();

        let history = AuditHistoryHandler::new(store.clone(), store)
            .handle(AuditHistoryQuery {
                subscription_id: sub.id,
            })
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        assert!(history[0].is_creation());
        assert_eq!(history[1].after_status, SubscriptionStatus::Cancelled);
        assert!(!history[1].timestamp.is_before(&history[0].timestamp));
    }

    #[tokio::test]
    async fn unknown_subscription_is_not_found() {
        let store = Arc::new(InMemoryBillingStore::new());
        let missing = SubscriptionId::new();

        let err = AuditHistoryHandler::new(store.clone(), store)
            .handle(AuditHistoryQuery {
                subscription_id: missing,
            })
            .await
            .unwrap_err();

        assert_eq!(err, SubscriptionError::SubscriptionNotFound(missing));
    }
}
