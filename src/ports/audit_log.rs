//! Audit log read port. Entries are appended by the subscription
//! repository as part of each transition.

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::subscription::AuditEntry;
use async_trait::async_trait;

#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Entries for one subscription in the order they were written.
    async fn history(&self, subscription_id: &SubscriptionId)
        -> Result<Vec<AuditEntry>, DomainError>;

    /// All entries with a timestamp before `until`, chronological.
    async fn entries_until(&self, until: Timestamp) -> Result<Vec<AuditEntry>, DomainError>;
}
