//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `TUTORLY` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use tutorly::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod payment;
mod scheduler;
mod server;
mod subscription;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use scheduler::SchedulerConfig;
pub use server::{Environment, ServerConfig};
pub use subscription::SubscriptionConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection; optional for local runs
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Gateway signing secret and currency defaults
    pub payment: PaymentConfig,

    #[serde(default)]
    pub subscription: SubscriptionConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `TUTORLY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// - `TUTORLY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `TUTORLY__PAYMENT__GATEWAY_KEY_SECRET=...` -> `payment.gateway_key_secret`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TUTORLY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first section's `ValidationError`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.subscription.validate()?;
        self.scheduler.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "TUTORLY__PAYMENT__GATEWAY_KEY_SECRET",
        "TUTORLY__SERVER__PORT",
        "TUTORLY__SUBSCRIPTION__TRIAL_DAYS",
        "TUTORLY__SCHEDULER__ENABLED",
        "TUTORLY__DATABASE__URL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_minimal_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("TUTORLY__PAYMENT__GATEWAY_KEY_SECRET", "rzp_secret");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.payment.gateway_key_secret.expose_secret(), "rzp_secret");
        assert_eq!(config.payment.default_currency, "INR");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.subscription.trial_days, 7);
        assert!(config.scheduler.enabled);
        assert!(config.database.url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("TUTORLY__PAYMENT__GATEWAY_KEY_SECRET", "rzp_secret");
        env::set_var("TUTORLY__SERVER__PORT", "9090");
        env::set_var("TUTORLY__SUBSCRIPTION__TRIAL_DAYS", "14");
        env::set_var("TUTORLY__SCHEDULER__ENABLED", "false");
        env::set_var("TUTORLY__DATABASE__URL", "postgres://localhost/tutorly");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.subscription.trial_days, 14);
        assert!(!config.scheduler.enabled);
        assert_eq!(config.database.url(), Some("postgres://localhost/tutorly"));
    }

    #[test]
    fn test_missing_gateway_secret_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
