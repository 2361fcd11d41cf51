//! Analytics handlers.
//!
//! ## Queries
//! - Subscription overview (MRR, churn, plan distribution)

mod compute_overview;

pub use compute_overview::{ComputeOverviewHandler, ComputeOverviewQuery};
