//! PostgreSQL implementation of AuditLog.
//!
//! `seq` is a BIGSERIAL, so ordering by it is insertion order even when two
//! entries share a timestamp.

use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{db_error, AuditRow, AUDIT_COLUMNS};
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::subscription::AuditEntry;
use crate::ports::AuditLog;

pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn history(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscription_audit_log WHERE subscription_id = $1 ORDER BY seq",
            AUDIT_COLUMNS
        );
        let rows: Vec<AuditRow> = sqlx::query_as(&sql)
            .bind(subscription_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load audit history"))?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    async fn entries_until(&self, until: Timestamp) -> Result<Vec<AuditEntry>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscription_audit_log WHERE occurred_at < $1 ORDER BY seq",
            AUDIT_COLUMNS
        );
        let rows: Vec<AuditRow> = sqlx::query_as(&sql)
            .bind(until.as_datetime())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load audit entries"))?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}
