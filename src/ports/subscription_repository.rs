//! Subscription repository port (write side).
//!
//! # Design
//!
//! - **Atomic commit**: the new row, its audit entry and an optional payment
//!   are written in one transaction
//! - **Optimistic locking**: the row is updated only if its stored version
//!   still equals `expected_version`
//! - **Idempotent payments**: a payment whose gateway ref already exists
//!   aborts the whole commit and hands back the stored row

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::payment::Payment;
use crate::domain::subscription::{AuditEntry, Subscription};
use async_trait::async_trait;

/// Everything one transition writes.
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    pub subscription: Subscription,
    /// Version read before the transition was computed.
    pub expected_version: i64,
    pub audit_entry: AuditEntry,
    pub payment: Option<Payment>,
}

/// Outcome of [`SubscriptionRepository::commit_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Another writer moved the version on; nothing was written.
    VersionConflict,
    /// The payment ref was already processed; nothing was written.
    DuplicatePayment(Payment),
}

/// Repository port for Subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert a new subscription with its creation audit entry.
    ///
    /// # Errors
    ///
    /// - `OpenSubscriptionExists` (with a `user_id` detail) if the user
    ///   already holds a trial, active or paused subscription
    /// - `DatabaseError` on persistence failure
    async fn create(
        &self,
        subscription: &Subscription,
        audit_entry: &AuditEntry,
    ) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// The user's trial, active or paused subscription, if any.
    async fn find_open_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Most recently created subscription for the user, any status.
    async fn find_latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Conditionally write a transition.
    ///
    /// # Errors
    ///
    /// - `OpenSubscriptionExists` if reopening would break the one-open rule
    /// - `DatabaseError` on persistence failure
    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<CommitOutcome, DomainError>;

    /// Trial or active subscriptions whose period ended before `now`,
    /// oldest period end first, at most `limit` rows.
    async fn find_due_for_expiry(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<Subscription>, DomainError>;
}
