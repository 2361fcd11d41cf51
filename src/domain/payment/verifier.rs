//! Gateway signature verification.
//!
//! The gateway signs `order_ref|payment_ref` with HMAC-SHA256 using the
//! shared key secret and sends the lowercase hex digest. Verification is
//! purely local; it never calls the gateway.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::VerificationError;

type HmacSha256 = Hmac<Sha256>;

/// Verifier for payment confirmation signatures.
pub struct PaymentSignatureVerifier {
    secret: SecretString,
}

impl PaymentSignatureVerifier {
    /// Creates a verifier from the gateway key secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Checks `signature` against the refs.
    ///
    /// # Errors
    ///
    /// `BadSignature` on mismatch or if the signature is not valid hex.
    pub fn verify(
        &self,
        order_ref: &str,
        payment_ref: &str,
        signature: &str,
    ) -> Result<(), VerificationError> {
        let provided =
            hex::decode(signature.trim()).map_err(|_| VerificationError::BadSignature)?;
        let expected = self.digest(order_ref, payment_ref)?;

        if constant_time_compare(&expected, &provided) {
            Ok(())
        } else {
            Err(VerificationError::BadSignature)
        }
    }

    /// Produces the hex signature the gateway would send for these refs.
    pub fn sign(&self, order_ref: &str, payment_ref: &str) -> Result<String, VerificationError> {
        Ok(hex::encode(self.digest(order_ref, payment_ref)?))
    }

    fn digest(&self, order_ref: &str, payment_ref: &str) -> Result<Vec<u8>, VerificationError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| VerificationError::BadSignature)?;
        mac.update(order_ref.as_bytes());
        mac.update(b"|");
        mac.update(payment_ref.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for PaymentSignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentSignatureVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Constant-time comparison; length mismatch returns early.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
