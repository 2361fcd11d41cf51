//! HTTP adapters - REST API over axum.

pub mod billing;
pub mod middleware;

pub use billing::{billing_router, BillingAppState, BillingSettings};
