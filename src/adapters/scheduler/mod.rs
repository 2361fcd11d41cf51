//! Scheduler adapter - timer-driven expiry sweeps.

mod expiry_scheduler;

pub use expiry_scheduler::{ExpiryScheduler, ExpirySchedulerConfig};
