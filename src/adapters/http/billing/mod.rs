//! HTTP adapter for the billing API.
//!
//! ## Learner
//! - `GET /api/plans` - active plan catalog
//! - `GET /api/plans/:plan_id` - single plan
//! - `POST /api/subscriptions/trial` - start a free trial
//! - `GET /api/subscriptions/me/access` - access status and badge
//! - `POST /api/subscriptions/me/cancel` - cancel own subscription
//! - `POST /api/payments/confirm` - client checkout callback
//!
//! ## Gateway
//! - `POST /api/webhooks/payments` - signed payment notification
//!
//! ## Admin
//! - `POST /api/admin/plans`, `POST /api/admin/plans/:plan_id/deactivate`
//! - `GET /api/admin/subscriptions` - filtered, paginated listing
//! - `POST /api/admin/subscriptions/:id/{override,cancel,pause}`
//! - `GET /api/admin/subscriptions/:id/audit`
//! - `GET /api/admin/analytics/overview`
//! - `POST /api/admin/scheduler/sweep`

mod admin;
pub mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{admin_routes, billing_router, learner_routes, webhook_routes};
pub use state::{BillingAppState, BillingSettings};
