//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::plan::normalize_currency;

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Public key id, only used to tell test keys from live keys
    #[serde(default)]
    pub gateway_key_id: Option<String>,

    /// Shared secret used to verify payment signatures
    pub gateway_key_secret: SecretString,

    /// Currency assumed for plans created without one
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

impl PaymentConfig {
    pub fn new(gateway_key_secret: impl Into<String>) -> Self {
        Self {
            gateway_key_id: None,
            gateway_key_secret: SecretString::new(gateway_key_secret.into()),
            default_currency: default_currency(),
        }
    }

    /// Check if using gateway test keys
    pub fn is_test_mode(&self) -> bool {
        self.gateway_key_id
            .as_deref()
            .map(|id| id.starts_with("rzp_test_"))
            .unwrap_or(false)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.gateway_key_secret.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__GATEWAY_KEY_SECRET"));
        }
        normalize_currency(&self.default_currency)
            .map_err(|_| ValidationError::InvalidCurrency(self.default_currency.clone()))?;
        Ok(())
    }
}

fn default_currency() -> String {
    "INR".to_string()
}
