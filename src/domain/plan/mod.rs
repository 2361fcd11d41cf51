//! Plan catalog domain.
//!
//! - `billing_period` - monthly / quarterly / yearly cadence
//! - `plan` - immutable plan versions

mod billing_period;
#[allow(clippy::module_inception)]
mod plan;

pub use billing_period::BillingPeriod;
pub use plan::{normalize_currency, Plan, MAX_PRICE_MINOR_UNITS};
