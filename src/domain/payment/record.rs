//! Durable record of a processed gateway charge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{PaymentId, SubscriptionId, Timestamp, ValidationError};

/// Lifecycle of a payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "payment_status",
                format!("unknown payment status '{}'", other),
            )),
        }
    }
}

/// One processed charge. `gateway_payment_ref` is unique across all rows
/// and serves as the idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub subscription_id: SubscriptionId,
    pub amount_minor_units: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub gateway_payment_ref: String,
    pub gateway_order_ref: String,
    pub signature: String,
    /// Period end the subscription reached when this payment was applied.
    pub grants_access_until: Timestamp,
    pub created_at: Timestamp,
}

impl Payment {
    /// Builds the completed row written together with a `PaymentVerified`
    /// transition.
    #[allow(clippy::too_many_arguments)]
    pub fn completed(
        subscription_id: SubscriptionId,
        amount_minor_units: i64,
        currency: impl Into<String>,
        gateway_payment_ref: impl Into<String>,
        gateway_order_ref: impl Into<String>,
        signature: impl Into<String>,
        grants_access_until: Timestamp,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            subscription_id,
            amount_minor_units,
            currency: currency.into(),
            status: PaymentStatus::Completed,
            gateway_payment_ref: gateway_payment_ref.into(),
            gateway_order_ref: gateway_order_ref.into(),
            signature: signature.into(),
            grants_access_until,
            created_at,
        }
    }
}

/// Outcome of a successful verification; identical on replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedPayment {
    pub payment_id: PaymentId,
    pub subscription_id: SubscriptionId,
    pub gateway_payment_ref: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub access_until: Timestamp,
}

impl From<&Payment> for VerifiedPayment {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id,
            subscription_id: payment.subscription_id,
            gateway_payment_ref: payment.gateway_payment_ref.clone(),
            amount_minor_units: payment.amount_minor_units,
            currency: payment.currency.clone(),
            access_until: payment.grants_access_until,
        }
    }
}
