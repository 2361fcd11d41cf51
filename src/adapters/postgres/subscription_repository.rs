//! PostgreSQL implementation of SubscriptionRepository.
//!
//! A transition commit is one database transaction:
//!
//! 1. insert the payment row (`ON CONFLICT (gateway_payment_ref) DO NOTHING`)
//! 2. conditional update `WHERE id = $1 AND version = $expected`
//! 3. append the audit entry
//!
//! Zero rows from step 1 or step 2 rolls back and reports the outcome.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::rows::{
    db_error, open_subscription_exists, violates_one_open, PaymentRow, SubscriptionRow,
    PAYMENT_COLUMNS, SUBSCRIPTION_COLUMNS,
};
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::payment::Payment;
use crate::domain::subscription::{AuditEntry, Subscription};
use crate::ports::{CommitOutcome, SubscriptionRepository, TransitionCommit};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        bind: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE {} ORDER BY created_at DESC LIMIT 1",
            SUBSCRIPTION_COLUMNS, clause
        );
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load subscription"))?;

        row.map(Subscription::try_from).transpose()
    }
}

async fn insert_audit(
    tx: &mut Transaction<'_, Postgres>,
    entry: &AuditEntry,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO subscription_audit_log (
            id, subscription_id, actor, actor_ref, action, reason,
            before_status, after_status, occurred_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.subscription_id.as_uuid())
    .bind(entry.actor.as_str())
    .bind(&entry.actor_ref)
    .bind(&entry.action)
    .bind(&entry.reason)
    .bind(entry.before_status.map(|s| s.as_str()))
    .bind(entry.after_status.as_str())
    .bind(entry.timestamp.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error("append audit entry"))?;

    Ok(())
}

/// Inserts the payment; `false` when the gateway ref was already recorded.
async fn insert_payment(
    tx: &mut Transaction<'_, Postgres>,
    payment: &Payment,
) -> Result<bool, DomainError> {
    let result = sqlx::query(
        r#"
        INSERT INTO payments (
            id, subscription_id, amount_minor_units, currency, status, gateway_payment_ref,
            gateway_order_ref, signature, grants_access_until, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (gateway_payment_ref) DO NOTHING
        "#,
    )
    .bind(payment.id.as_uuid())
    .bind(payment.subscription_id.as_uuid())
    .bind(payment.amount_minor_units)
    .bind(&payment.currency)
    .bind(payment.status.as_str())
    .bind(&payment.gateway_payment_ref)
    .bind(&payment.gateway_order_ref)
    .bind(&payment.signature)
    .bind(payment.grants_access_until.as_datetime())
    .bind(payment.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(db_error("record payment"))?;

    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn create(
        &self,
        subscription: &Subscription,
        audit_entry: &AuditEntry,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_id, status, start_date, current_period_end,
                gateway_subscription_ref, cancelled_at, cancel_reason, version,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(subscription.plan_id.as_uuid())
        .bind(subscription.status.as_str())
        .bind(subscription.start_date.as_datetime())
        .bind(subscription.current_period_end.as_datetime())
        .bind(&subscription.gateway_subscription_ref)
        .bind(subscription.cancelled_at.map(|t| *t.as_datetime()))
        .bind(&subscription.cancel_reason)
        .bind(subscription.version)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if violates_one_open(&e) {
                open_subscription_exists(&subscription.user_id)
            } else {
                db_error("create subscription")(e)
            }
        })?;

        insert_audit(&mut tx, audit_entry).await?;
        tx.commit().await.map_err(db_error("commit subscription"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let sql = format!("SELECT {} FROM subscriptions WHERE id = $1", SUBSCRIPTION_COLUMNS);
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load subscription"))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_open_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        self.fetch_one_where(
            "user_id = $1 AND status IN ('trial', 'active', 'paused')",
            user_id.as_str(),
        )
        .await
    }

    async fn find_latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        self.fetch_one_where("user_id = $1", user_id.as_str()).await
    }

    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<CommitOutcome, DomainError> {
        let next = &commit.subscription;
        let mut tx = self.pool.begin().await.map_err(db_error("begin transaction"))?;

        if let Some(payment) = &commit.payment {
            if !insert_payment(&mut tx, payment).await? {
                tx.rollback().await.map_err(db_error("roll back"))?;
                let sql = format!(
                    "SELECT {} FROM payments WHERE gateway_payment_ref = $1",
                    PAYMENT_COLUMNS
                );
                let existing: PaymentRow = sqlx::query_as(&sql)
                    .bind(&payment.gateway_payment_ref)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(db_error("load duplicate payment"))?;
                return Ok(CommitOutcome::DuplicatePayment(Payment::try_from(existing)?));
            }
        }

        let updated = sqlx::query(
            r#"
            UPDATE subscriptions SET
                plan_id = $3,
                status = $4,
                current_period_end = $5,
                gateway_subscription_ref = $6,
                cancelled_at = $7,
                cancel_reason = $8,
                version = $9,
                updated_at = $10
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(next.id.as_uuid())
        .bind(commit.expected_version)
        .bind(next.plan_id.as_uuid())
        .bind(next.status.as_str())
        .bind(next.current_period_end.as_datetime())
        .bind(&next.gateway_subscription_ref)
        .bind(next.cancelled_at.map(|t| *t.as_datetime()))
        .bind(&next.cancel_reason)
        .bind(next.version)
        .bind(next.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if violates_one_open(&e) {
                open_subscription_exists(&next.user_id)
            } else {
                db_error("update subscription")(e)
            }
        })?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(db_error("roll back"))?;
            return Ok(CommitOutcome::VersionConflict);
        }

        insert_audit(&mut tx, &commit.audit_entry).await?;
        tx.commit().await.map_err(db_error("commit transition"))?;
        Ok(CommitOutcome::Committed)
    }

    async fn find_due_for_expiry(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<Subscription>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscriptions \
             WHERE status IN ('trial', 'active') AND current_period_end < $1 \
             ORDER BY current_period_end \
             LIMIT $2",
            SUBSCRIPTION_COLUMNS
        );
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(now.as_datetime())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load due subscriptions"))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}
