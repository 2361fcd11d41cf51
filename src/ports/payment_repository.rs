//! Payment read port.
//!
//! Payments are only ever written through
//! `SubscriptionRepository::commit_transition`, so this port is read-only.

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::payment::Payment;
use async_trait::async_trait;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Lookup by the idempotency key.
    async fn find_by_gateway_ref(
        &self,
        gateway_payment_ref: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Payments for one subscription, oldest first.
    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Payment>, DomainError>;

    /// Payments created in `[from, to)`.
    async fn list_created_between(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Payment>, DomainError>;
}
