//! Row types and column conversions shared by the PostgreSQL adapters.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::foundation::{
    AuditEntryId, DomainError, ErrorCode, PaymentId, PlanId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::plan::Plan;
use crate::domain::subscription::{Actor, AuditEntry, Subscription, SubscriptionStatus};

pub(super) const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan_id, status, start_date, \
     current_period_end, gateway_subscription_ref, cancelled_at, cancel_reason, version, \
     created_at, updated_at";

pub(super) const PAYMENT_COLUMNS: &str = "id, subscription_id, amount_minor_units, currency, \
     status, gateway_payment_ref, gateway_order_ref, signature, grants_access_until, created_at";

pub(super) const AUDIT_COLUMNS: &str = "id, subscription_id, actor, actor_ref, action, reason, \
     before_status, after_status, occurred_at";

/// Partial unique index enforcing one open subscription per user.
pub(super) const ONE_OPEN_PER_USER: &str = "subscriptions_one_open_per_user";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PlanRow {
    id: Uuid,
    name: String,
    price_minor_units: i64,
    currency: String,
    billing_period: String,
    features: Vec<String>,
    active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(Plan {
            id: PlanId::from_uuid(row.id),
            name: row.name,
            price_minor_units: row.price_minor_units,
            currency: row.currency,
            billing_period: parse_column("billing_period", &row.billing_period)?,
            features: row.features,
            active: row.active,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    plan_id: Uuid,
    status: String,
    start_date: DateTime<Utc>,
    current_period_end: DateTime<Utc>,
    gateway_subscription_ref: Option<String>,
    cancelled_at: Option<DateTime<Utc>>,
    cancel_reason: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: parse_user_id(row.user_id)?,
            plan_id: PlanId::from_uuid(row.plan_id),
            status: parse_column::<SubscriptionStatus>("status", &row.status)?,
            start_date: Timestamp::from_datetime(row.start_date),
            current_period_end: Timestamp::from_datetime(row.current_period_end),
            gateway_subscription_ref: row.gateway_subscription_ref,
            cancelled_at: row.cancelled_at.map(Timestamp::from_datetime),
            cancel_reason: row.cancel_reason,
            version: row.version,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PaymentRow {
    id: Uuid,
    subscription_id: Uuid,
    amount_minor_units: i64,
    currency: String,
    status: String,
    gateway_payment_ref: String,
    gateway_order_ref: String,
    signature: String,
    grants_access_until: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            amount_minor_units: row.amount_minor_units,
            currency: row.currency,
            status: parse_column::<PaymentStatus>("status", &row.status)?,
            gateway_payment_ref: row.gateway_payment_ref,
            gateway_order_ref: row.gateway_order_ref,
            signature: row.signature,
            grants_access_until: Timestamp::from_datetime(row.grants_access_until),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct AuditRow {
    id: Uuid,
    subscription_id: Uuid,
    actor: String,
    actor_ref: Option<String>,
    action: String,
    reason: Option<String>,
    before_status: Option<String>,
    after_status: String,
    occurred_at: DateTime<Utc>,
}

impl TryFrom<AuditRow> for AuditEntry {
    type Error = DomainError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(AuditEntry {
            id: AuditEntryId::from_uuid(row.id),
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            actor: parse_column::<Actor>("actor", &row.actor)?,
            actor_ref: row.actor_ref,
            action: row.action,
            reason: row.reason,
            before_status: row
                .before_status
                .as_deref()
                .map(|s| parse_column::<SubscriptionStatus>("before_status", s))
                .transpose()?,
            after_status: parse_column("after_status", &row.after_status)?,
            timestamp: Timestamp::from_datetime(row.occurred_at),
        })
    }
}

fn parse_column<T>(column: &str, value: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid {} value '{}': {}", column, value, e),
        )
    })
}

fn parse_user_id(value: String) -> Result<UserId, DomainError> {
    UserId::new(value).map_err(|e| {
        DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
    })
}

/// Maps any sqlx error to a `DatabaseError` naming the failed operation.
pub(super) fn db_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Failed to {}: {}", operation, e),
        )
    }
}

pub(super) fn open_subscription_exists(user_id: &UserId) -> DomainError {
    DomainError::new(
        ErrorCode::OpenSubscriptionExists,
        "user already has an open subscription",
    )
    .with_detail("user_id", user_id.as_str())
}

/// True when `err` is a violation of the one-open-subscription index.
pub(super) fn violates_one_open(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint() == Some(ONE_OPEN_PER_USER),
        _ => false,
    }
}

/// Escapes `%`, `_` and `\` for use inside a LIKE pattern.
pub(super) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
