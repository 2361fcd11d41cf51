//! Subscription lifecycle configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Subscription lifecycle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Length of the free trial granted at signup
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,
}

impl SubscriptionConfig {
    /// Validate subscription configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=90).contains(&self.trial_days) {
            return Err(ValidationError::InvalidTrialDays);
        }
        Ok(())
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
        }
    }
}

fn default_trial_days() -> u32 {
    7
}
