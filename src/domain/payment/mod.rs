//! Payment verification domain.
//!
//! - `payload` - untrusted inbound confirmation and its structural checks
//! - `verifier` - HMAC-SHA256 signature check with constant-time compare
//! - `record` - the durable, write-once payment row
//! - `errors` - verification failures

mod errors;
mod payload;
mod record;
mod verifier;

pub use errors::{VerificationError, PAYMENT_NOT_CONFIRMED};
pub use payload::{GatewayPayload, PaymentConfirmation};
pub use record::{Payment, PaymentStatus, VerifiedPayment};
pub use verifier::PaymentSignatureVerifier;
