//! PostgreSQL implementation of PaymentRepository.
//!
//! Payments are written by `PostgresSubscriptionRepository::commit_transition`
//! together with their transition; this adapter only reads.

use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{db_error, PaymentRow, PAYMENT_COLUMNS};
use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::payment::Payment;
use crate::ports::PaymentRepository;

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn find_by_gateway_ref(
        &self,
        gateway_payment_ref: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM payments WHERE gateway_payment_ref = $1",
            PAYMENT_COLUMNS
        );
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(gateway_payment_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load payment"))?;

        row.map(Payment::try_from).transpose()
    }

    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Payment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM payments WHERE subscription_id = $1 ORDER BY created_at",
            PAYMENT_COLUMNS
        );
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(subscription_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list payments"))?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn list_created_between(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Payment>, DomainError> {
        let sql = format!(
            "SELECT {} FROM payments WHERE created_at >= $1 AND created_at < $2 ORDER BY created_at",
            PAYMENT_COLUMNS
        );
        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(from.as_datetime())
            .bind(to.as_datetime())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list payments in window"))?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
