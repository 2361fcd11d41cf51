//! Subscription lifecycle domain.
//!
//! Owns the status enum, the event vocabulary, the transition rules and
//! the audit trail they produce.

mod aggregate;
mod audit;
mod errors;
mod events;
mod status;

pub use aggregate::{Subscription, Transition};
pub use audit::{Actor, AuditEntry};
pub use errors::{OverrideGuard, SubscriptionError};
pub use events::{AdminOverride, SubscriptionEvent};
pub use status::{BadgeTone, SubscriptionStatus};
