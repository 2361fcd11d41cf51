//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Write Ports
//!
//! - `PlanRepository` - Append-only plan catalog
//! - `SubscriptionRepository` - Subscription rows with atomic, versioned transition commits
//!
//! ## Read Ports
//!
//! - `SubscriptionReader` - Admin listing and analytics input
//! - `PaymentRepository` - Payment lookups, including the idempotency key
//! - `AuditLog` - Chronological audit history

mod audit_log;
mod payment_repository;
mod plan_repository;
mod subscription_reader;
mod subscription_repository;

pub use audit_log::AuditLog;
pub use payment_repository::PaymentRepository;
pub use plan_repository::PlanRepository;
pub use subscription_reader::{
    Page, PageRequest, SubscriptionFilter, SubscriptionReader, MAX_PAGE_LIMIT,
};
pub use subscription_repository::{CommitOutcome, SubscriptionRepository, TransitionCommit};
