//! PostgreSQL adapters - sqlx implementations of the repository ports.
//!
//! - `PostgresPlanRepository` - plan catalog
//! - `PostgresSubscriptionRepository` - subscription writes and transactional transition commits
//! - `PostgresSubscriptionReader` - admin listing and analytics reads
//! - `PostgresPaymentRepository` - payment reads
//! - `PostgresAuditLog` - audit trail reads
//!
//! Schema lives in `migrations/`.

mod audit_log;
mod payment_repository;
mod plan_repository;
mod rows;
mod subscription_reader;
mod subscription_repository;

pub use audit_log::PostgresAuditLog;
pub use payment_repository::PostgresPaymentRepository;
pub use plan_repository::PostgresPlanRepository;
pub use subscription_reader::PostgresSubscriptionReader;
pub use subscription_repository::PostgresSubscriptionRepository;

/// Migrations bundled into the binary.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
