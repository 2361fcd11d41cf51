//! Admin handlers.
//!
//! ## Commands
//! - Override subscription (status, plan, end date)
//! - Admin cancel
//!
//! ## Queries
//! - Audit history
//! - Filtered, paginated subscription listing

mod admin_cancel;
mod audit_history;
mod list_subscriptions;
mod override_subscription;

// Commands
pub use admin_cancel::{AdminCancelCommand, AdminCancelHandler};
pub use override_subscription::{
    OverrideSubscriptionCommand, OverrideSubscriptionHandler, OverrideSubscriptionResult,
};

// Queries
pub use audit_history::{AuditHistoryHandler, AuditHistoryQuery};
pub use list_subscriptions::{ListSubscriptionsHandler, ListSubscriptionsQuery};
