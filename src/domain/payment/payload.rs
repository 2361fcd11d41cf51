//! Inbound payment confirmation payload.
//!
//! The same shape arrives from the browser-relayed checkout callback and
//! from the gateway webhook, so both accept the camelCase names and the
//! gateway's own `razorpay_*` field names.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, SubscriptionId};

use super::VerificationError;

/// Raw, untrusted confirmation payload. Every field is optional so a
/// missing field is reported as `GatewayPayloadMalformed` rather than a
/// deserialisation failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPayload {
    #[serde(
        default,
        alias = "gatewayOrderRef",
        alias = "razorpay_order_id",
        alias = "orderId"
    )]
    pub gateway_order_ref: Option<String>,

    #[serde(
        default,
        alias = "gatewayPaymentRef",
        alias = "razorpay_payment_id",
        alias = "paymentId"
    )]
    pub gateway_payment_ref: Option<String>,

    #[serde(default, alias = "razorpay_signature")]
    pub signature: Option<String>,

    #[serde(default, alias = "subscriptionId")]
    pub subscription_id: Option<String>,

    #[serde(default, alias = "planId")]
    pub plan_id: Option<String>,

    #[serde(
        default,
        alias = "gatewaySubscriptionRef",
        alias = "razorpay_subscription_id"
    )]
    pub gateway_subscription_ref: Option<String>,
}

/// Structurally valid confirmation, not yet signature-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub gateway_order_ref: String,
    pub gateway_payment_ref: String,
    pub signature: String,
    pub subscription_id: SubscriptionId,
    pub plan_id: PlanId,
    pub gateway_subscription_ref: Option<String>,
}

impl GatewayPayload {
    /// Checks that every required field is present and well-formed.
    pub fn into_confirmation(self) -> Result<PaymentConfirmation, VerificationError> {
        let gateway_order_ref = required(self.gateway_order_ref, "gateway_order_ref")?;
        let gateway_payment_ref = required(self.gateway_payment_ref, "gateway_payment_ref")?;
        let signature = required(self.signature, "signature")?;
        let subscription_id = required(self.subscription_id, "subscription_id")?
            .parse()
            .map_err(|_| VerificationError::GatewayPayloadMalformed("subscription_id"))?;
        let plan_id = required(self.plan_id, "plan_id")?
            .parse()
            .map_err(|_| VerificationError::GatewayPayloadMalformed("plan_id"))?;
        let gateway_subscription_ref = self
            .gateway_subscription_ref
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        Ok(PaymentConfirmation {
            gateway_order_ref,
            gateway_payment_ref,
            signature,
            subscription_id,
            plan_id,
            gateway_subscription_ref,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, VerificationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(VerificationError::GatewayPayloadMalformed(field))
}
