//! Payment handlers.
//!
//! ## Commands
//! - Verifying a payment confirmation (client callback or gateway webhook)

mod verify_payment;

pub use verify_payment::{
    ConfirmationSource, VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult,
};
