//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `plan` - Plan catalog entries and billing periods
//! - `subscription` - Subscription state machine, events and audit trail
//! - `payment` - Payment records and gateway signature verification
//! - `analytics` - Pure rollups (MRR, churn, plan distribution)

pub mod analytics;
pub mod foundation;
pub mod payment;
pub mod plan;
pub mod subscription;
