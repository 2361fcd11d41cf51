//! Analytics rollups. Read-only; never mutates state.

mod overview;
mod window;

pub use overview::{compute_overview, PlanShare, SubscriptionOverview};
pub use window::{ChurnRate, ReportingWindow};
