//! Payment verification errors.

use thiserror::Error;

/// Text shown to users for any verification failure.
pub const PAYMENT_NOT_CONFIRMED: &str = "Payment could not be confirmed";

/// Reasons an inbound payment confirmation is rejected.
///
/// Neither variant is retryable: a bad signature is a security event and a
/// malformed payload will not improve on redelivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// HMAC over the order and payment refs did not match.
    #[error("Invalid payment signature")]
    BadSignature,

    /// A required field was missing, blank or unparseable.
    #[error("Malformed gateway payload: {0}")]
    GatewayPayloadMalformed(&'static str),
}

impl VerificationError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Generic message that does not reveal which check failed.
    pub fn user_message(&self) -> &'static str {
        PAYMENT_NOT_CONFIRMED
    }
}
