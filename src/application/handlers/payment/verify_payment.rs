//! VerifyPaymentHandler - Command handler for inbound payment confirmations.
//!
//! Both the browser-relayed checkout callback and the gateway webhook end
//! up here.
//!
//! # Flow
//!
//! 1. Structural check of the payload (missing fields rejected first)
//! 2. HMAC signature check (security event on failure)
//! 3. Idempotency lookup on the gateway payment ref
//! 4. Payment row + `PaymentVerified` transition committed together

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::payment::{
    GatewayPayload, Payment, PaymentConfirmation, PaymentSignatureVerifier, VerifiedPayment,
};
use crate::domain::subscription::{SubscriptionError, SubscriptionEvent, SubscriptionStatus};
use crate::ports::{PaymentRepository, PlanRepository, SubscriptionRepository};

use super::super::subscription::{Decision, ExecutionOutcome, TransitionExecutor};

/// Where the confirmation came from. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationSource {
    ClientCallback,
    Webhook,
}

impl ConfirmationSource {
    fn as_str(&self) -> &'static str {
        match self {
            ConfirmationSource::ClientCallback => "client_callback",
            ConfirmationSource::Webhook => "webhook",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub payload: GatewayPayload,
    pub source: ConfirmationSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPaymentResult {
    pub payment: VerifiedPayment,
    /// True when the ref had already been processed.
    pub replayed: bool,
}

pub struct VerifyPaymentHandler {
    plans: Arc<dyn PlanRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
    verifier: Arc<PaymentSignatureVerifier>,
    executor: TransitionExecutor,
}

impl VerifyPaymentHandler {
    pub fn new(
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        verifier: Arc<PaymentSignatureVerifier>,
    ) -> Self {
        Self {
            executor: TransitionExecutor::new(subscriptions.clone()),
            plans,
            subscriptions,
            payments,
            verifier,
        }
    }

    pub async fn handle(
        &self,
        cmd: VerifyPaymentCommand,
    ) -> Result<VerifyPaymentResult, SubscriptionError> {
        let source = cmd.source.as_str();

        // 1. Structural check
        let confirmation = cmd.payload.into_confirmation().map_err(|err| {
            tracing::warn!(source, error = %err, "Rejected malformed payment payload");
            err
        })?;

        // 2. Signature check
        self.verifier
            .verify(
                &confirmation.gateway_order_ref,
                &confirmation.gateway_payment_ref,
                &confirmation.signature,
            )
            .map_err(|err| {
                tracing::warn!(
                    source,
                    order_ref = %confirmation.gateway_order_ref,
                    payment_ref = %confirmation.gateway_payment_ref,
                    subscription_id = %confirmation.subscription_id,
                    "Payment signature mismatch"
                );
                err
            })?;

        // 3. Idempotency
        if let Some(existing) = self
            .payments
            .find_by_gateway_ref(&confirmation.gateway_payment_ref)
            .await?
        {
            return Ok(self.replay(&existing, source));
        }

        // 4. Resolve plan and subscription
        let plan = self
            .plans
            .find_by_id(&confirmation.plan_id)
            .await?
            .ok_or(SubscriptionError::PlanNotFound(confirmation.plan_id))?;

        let subscription = self
            .subscriptions
            .find_by_id(&confirmation.subscription_id)
            .await?
            .ok_or(SubscriptionError::SubscriptionNotFound(
                confirmation.subscription_id,
            ))?;

        if subscription.status == SubscriptionStatus::Expired {
            if let Some(other) = self
                .subscriptions
                .find_open_for_user(&subscription.user_id)
                .await?
            {
                if other.id != subscription.id {
                    return Err(SubscriptionError::OpenSubscriptionExists(
                        subscription.user_id,
                    ));
                }
            }
        }

        // 5. Commit payment and transition together
        let PaymentConfirmation {
            gateway_order_ref,
            gateway_payment_ref,
            signature,
            subscription_id,
            plan_id,
            gateway_subscription_ref,
        } = confirmation;

        let outcome = self
            .executor
            .execute(subscription_id, Timestamp::now(), |current, now| {
                let new_period_end = plan
                    .billing_period
                    .advance(current.current_period_end.max(now));
                let payment = Payment::completed(
                    current.id,
                    plan.price_minor_units,
                    plan.currency.clone(),
                    gateway_payment_ref.clone(),
                    gateway_order_ref.clone(),
                    signature.clone(),
                    new_period_end,
                    now,
                );
                Ok(Decision::Apply {
                    event: SubscriptionEvent::PaymentVerified {
                        plan_id,
                        new_period_end,
                        gateway_subscription_ref: gateway_subscription_ref.clone(),
                    },
                    payment: Some(payment),
                })
            })
            .await?;

        match outcome {
            ExecutionOutcome::Applied {
                payment: Some(payment),
                ..
            } => Ok(VerifyPaymentResult {
                payment: VerifiedPayment::from(&payment),
                replayed: false,
            }),
            ExecutionOutcome::DuplicatePayment(existing) => Ok(self.replay(&existing, source)),
            _ => Err(SubscriptionError::infrastructure(
                "payment transition completed without a payment row",
            )),
        }
    }

    fn replay(&self, existing: &Payment, source: &str) -> VerifyPaymentResult {
        tracing::debug!(
            source,
            payment_ref = %existing.gateway_payment_ref,
            subscription_id = %existing.subscription_id,
            "Payment already processed, returning stored result"
        );
        VerifyPaymentResult {
            payment: VerifiedPayment::from(existing),
            replayed: true,
        }
    }
}
