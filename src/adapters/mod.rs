//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - in-process store for tests and local runs
//! - `postgres` - sqlx-backed repositories
//! - `http` - axum REST surface
//! - `scheduler` - timer loop driving expiry sweeps

pub mod http;
pub mod memory;
pub mod postgres;
pub mod scheduler;

pub use memory::InMemoryBillingStore;
pub use scheduler::{ExpiryScheduler, ExpirySchedulerConfig};
