//! TransitionExecutor - read, decide, apply, conditionally write.
//!
//! Every state change goes through here so that the version check, the
//! bounded retry and the audit write cannot be skipped by a caller.

use std::sync::Arc;

use crate::domain::foundation::{SubscriptionId, Timestamp};
use crate::domain::payment::Payment;
use crate::domain::subscription::{
    Subscription, SubscriptionError, SubscriptionEvent, Transition,
};
use crate::ports::{CommitOutcome, SubscriptionRepository, TransitionCommit};

/// Attempts before a conflict is surfaced as `ConcurrentModification`.
pub const MAX_TRANSITION_ATTEMPTS: u32 = 3;

/// What to do with the freshly read subscription.
#[derive(Debug, Clone)]
pub enum Decision {
    Apply {
        event: SubscriptionEvent,
        /// Written in the same commit as the transition.
        payment: Option<Payment>,
    },
    /// Nothing to do; the row no longer needs this change.
    Skip,
}

impl Decision {
    pub fn apply(event: SubscriptionEvent) -> Self {
        Decision::Apply {
            event,
            payment: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Applied {
        transition: Transition,
        payment: Option<Payment>,
    },
    Skipped(Subscription),
    /// The payment ref was processed by someone else first.
    DuplicatePayment(Payment),
}

impl ExecutionOutcome {
    /// Unwraps the applied transition for callers that never skip or pay.
    pub fn into_transition(self) -> Result<Transition, SubscriptionError> {
        match self {
            ExecutionOutcome::Applied { transition, .. } => Ok(transition),
            ExecutionOutcome::Skipped(sub) => Err(SubscriptionError::infrastructure(format!(
                "transition on {} was skipped",
                sub.id
            ))),
            ExecutionOutcome::DuplicatePayment(p) => Err(SubscriptionError::infrastructure(
                format!("unexpected duplicate payment {}", p.gateway_payment_ref),
            )),
        }
    }
}

/// Runs transitions with optimistic concurrency.
#[derive(Clone)]
pub struct TransitionExecutor {
    repository: Arc<dyn SubscriptionRepository>,
}

impl TransitionExecutor {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    /// Reads the subscription, asks `decide` what to do, applies the event
    /// and writes it back conditioned on the version that was read.
    ///
    /// `decide` runs again on every retry against the re-read row.
    ///
    /// # Errors
    ///
    /// - `SubscriptionNotFound` if the id does not resolve
    /// - whatever `decide` or `Subscription::apply` reject with
    /// - `ConcurrentModification` after `MAX_TRANSITION_ATTEMPTS` conflicts
    pub async fn execute<F>(
        &self,
        subscription_id: SubscriptionId,
        now: Timestamp,
        mut decide: F,
    ) -> Result<ExecutionOutcome, SubscriptionError>
    where
        F: FnMut(&Subscription, Timestamp) -> Result<Decision, SubscriptionError> + Send,
    {
        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self
                .repository
                .find_by_id(&subscription_id)
                .await?
                .ok_or(SubscriptionError::SubscriptionNotFound(subscription_id))?;

            let (event, payment) = match decide(&current, now)? {
                Decision::Skip => return Ok(ExecutionOutcome::Skipped(current)),
                Decision::Apply { event, payment } => (event, payment),
            };

            let transition = current.apply(&event, now)?;

            let outcome = self
                .repository
                .commit_transition(TransitionCommit {
                    subscription: transition.subscription.clone(),
                    expected_version: current.version,
                    audit_entry: transition.audit.clone(),
                    payment: payment.clone(),
                })
                .await?;

            match outcome {
                CommitOutcome::Committed => {
                    tracing::info!(
                        subscription_id = %subscription_id,
                        from = %current.status,
                        to = %transition.subscription.status,
                        actor = %transition.audit.actor,
                        action = %transition.audit.action,
                        version = transition.subscription.version,
                        "Subscription transition committed"
                    );
                    return Ok(ExecutionOutcome::Applied {
                        transition,
                        payment,
                    });
                }
                CommitOutcome::VersionConflict => {
                    tracing::warn!(
                        subscription_id = %subscription_id,
                        attempt,
                        expected_version = current.version,
                        "Version conflict on subscription, re-reading"
                    );
                }
                CommitOutcome::DuplicatePayment(existing) => {
                    return Ok(ExecutionOutcome::DuplicatePayment(existing));
                }
            }
        }

        Err(SubscriptionError::ConcurrentModification(subscription_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryBillingStore;
    use crate::domain::foundation::{DomainError, PlanId, UserId};
    use crate::domain::subscription::SubscriptionStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    /// Delegates to the in-memory store but reports a conflict for the first
    /// `conflicts` commits.
    struct ConflictingRepository {
        inner: InMemoryBillingStore,
        conflicts: Mutex<u32>,
        commits_seen: Mutex<u32>,
    }

    impl ConflictingRepository {
        fn new(conflicts: u32) -> Self {
            Self {
                inner: InMemoryBillingStore::new(),
                conflicts: Mutex::new(conflicts),
                commits_seen: Mutex::new(0),
            }
        }

        fn commits_seen(&self) -> u32 {
            *self.commits_seen.lock().unwrap()
        }
    }

    #[async_trait]
    impl SubscriptionRepository for ConflictingRepository {
        async fn create(
            &self,
            subscription: &Subscription,
            audit_entry: &crate::domain::subscription::AuditEntry,
        ) -> Result<(), DomainError> {
            self.inner.create(subscription, audit_entry).await
        }

        async fn find_by_id(
            &self,
            id: &SubscriptionId,
        ) -> Result<Option<Subscription>, DomainError> {
            SubscriptionRepository::find_by_id(&self.inner, id).await
        }

        async fn find_open_for_user(
            &self,
            user_id: &UserId,
        ) -> Result<Option<Subscription>, DomainError> {
            self.inner.find_open_for_user(user_id).await
        }

        async fn find_latest_for_user(
            &self,
            user_id: &UserId,
        ) -> Result<Option<Subscription>, DomainError> {
            self.inner.find_latest_for_user(user_id).await
        }

        async fn commit_transition(
            &self,
            commit: TransitionCommit,
        ) -> Result<CommitOutcome, DomainError> {
            *self.commits_seen.lock().unwrap() += 1;
            {
                let mut remaining = self.conflicts.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(CommitOutcome::VersionConflict);
                }
            }
            self.inner.commit_transition(commit).await
        }

        async fn find_due_for_expiry(
            &self,
            now: Timestamp,
            limit: u32,
        ) -> Result<Vec<Subscription>, DomainError> {
            self.inner.find_due_for_expiry(now, limit).await
        }
    }

    async fn seeded(repo: &ConflictingRepository) -> Subscription {
        let created = Subscription::start_trial(
            SubscriptionId::new(),
            UserId::new("learner-1").unwrap(),
            PlanId::new(),
            Timestamp::now(),
            7,
        );
        repo.create(&created.subscription, &created.audit)
            .await
            .unwrap();
        created.subscription
    }

    fn cancel() -> SubscriptionEvent {
        SubscriptionEvent::UserCancel {
            user_id: UserId::new("learner-1").unwrap(),
            reason: None,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn applies_on_first_attempt() {
        let repo = Arc::new(ConflictingRepository::new(0));
        let sub = seeded(&repo).await;
        let executor = TransitionExecutor::new(repo.clone());

        let outcome = executor
            .execute(sub.id, Timestamp::now(), |_, _| Ok(Decision::apply(cancel())))
            .await
            .unwrap();

        let transition = outcome.into_transition().unwrap();
        assert_eq!(transition.subscription.status, SubscriptionStatus::Cancelled);
        assert_eq!(repo.commits_seen(), 1);
    }

    #[tokio::test]
    async fn retries_after_conflict() {
        let repo = Arc::new(ConflictingRepository::new(2));
        let sub = seeded(&repo).await;
        let executor = TransitionExecutor::new(repo.clone());
        let mut decisions = 0;

        let outcome = executor
            .execute(sub.id, Timestamp::now(), |_, _| {
                decisions += 1;
                Ok(Decision::apply(cancel()))
            })
            .await
            .unwrap();

        assert!(matches!(outcome, ExecutionOutcome::Applied { .. }));
        assert_eq!(decisions, 3);
        assert_eq!(repo.commits_seen(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_three_conflicts() {
        let repo = Arc::new(ConflictingRepository::new(3));
        let sub = seeded(&repo).await;
        let executor = TransitionExecutor::new(repo.clone());

        let err = executor
            .execute(sub.id, Timestamp::now(), |_, _| Ok(Decision::apply(cancel())))
            .await
            .unwrap_err();

        assert_eq!(err, SubscriptionError::ConcurrentModification(sub.id));
        let stored = repo.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.version, sub.version);
    }

    #[tokio::test]
    async fn skip_writes_nothing() {
        let repo = Arc::new(ConflictingRepository::new(0));
        let sub = seeded(&repo).await;
        let executor = TransitionExecutor::new(repo.clone());

        let outcome = executor
            .execute(sub.id, Timestamp::now(), |_, _| Ok(Decision::Skip))
            .await
            .unwrap();

        assert!(matches!(outcome, ExecutionOutcome::Skipped(_)));
        assert_eq!(repo.commits_seen(), 0);
    }

    #[tokio::test]
    async fn illegal_event_is_not_retried() {
        let repo = Arc::new(ConflictingRepository::new(0));
        let sub = seeded(&repo).await;
        let executor = TransitionExecutor::new(repo.clone());

        let err = executor
            .execute(sub.id, Timestamp::now(), |_, _| {
                Ok(Decision::apply(SubscriptionEvent::GatewayPause { reason: None }))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::IllegalTransition { .. }));
        assert_eq!(repo.commits_seen(), 0);
    }

    #[tokio::test]
    async fn stale_writer_loses_to_committed_cancel() {
        let store = Arc::new(InMemoryBillingStore::new());
        let created = Subscription::start_trial(
            SubscriptionId::new(),
            UserId::new("learner-1").unwrap(),
            PlanId::new(),
            Timestamp::now(),
            7,
        );
        let mut active = created.subscription;
        active.status = SubscriptionStatus::Active;
        store.create(&active, &created.audit).await.unwrap();
        let now = Timestamp::now();

        // Both writers read the same active row.
        let cancelled = active.apply(&cancel(), now).unwrap();
        let paused = active
            .apply(&SubscriptionEvent::GatewayPause { reason: None }, now)
            .unwrap();

        let first = store
            .commit_transition(TransitionCommit {
                subscription: cancelled.subscription.clone(),
                expected_version: active.version,
                audit_entry: cancelled.audit,
                payment: None,
            })
            .await
            .unwrap();
        let second = store
            .commit_transition(TransitionCommit {
                subscription: paused.subscription,
                expected_version: active.version,
                audit_entry: paused.audit,
                payment: None,
            })
            .await
            .unwrap();

        assert_eq!(first, CommitOutcome::Committed);
        assert_eq!(second, CommitOutcome::VersionConflict);

        // The loser re-reads the cancelled row and can no longer pause it.
        let err = TransitionExecutor::new(store.clone())
            .execute(active.id, Timestamp::now(), |_, _| {
                Ok(Decision::apply(SubscriptionEvent::GatewayPause { reason: None }))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SubscriptionError::IllegalTransition { .. }));
        let stored = SubscriptionRepository::find_by_id(store.as_ref(), &active.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, cancelled.subscription);
        assert_eq!(stored.status, SubscriptionStatus::Cancelled);
        assert_eq!(store.audit_count(), 2);
    }

    #[tokio::test]
    async fn unknown_subscription_is_not_found() {
        let repo = Arc::new(ConflictingRepository::new(0));
        let executor = TransitionExecutor::new(repo);
        let id = SubscriptionId::new();

        let err = executor
            .execute(id, Timestamp::now(), |_, _| Ok(Decision::apply(cancel())))
            .await
            .unwrap_err();

        assert_eq!(err, SubscriptionError::SubscriptionNotFound(id));
    }
}
