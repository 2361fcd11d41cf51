//! Plan catalog handlers.
//!
//! ## Commands
//! - Creating a plan version (admin)
//! - Deactivating a plan version (admin)
//!
//! ## Queries
//! - Get plan by id
//! - List plans

mod create_plan;
mod deactivate_plan;
mod get_plan;
mod list_plans;

// Commands
pub use create_plan::{CreatePlanCommand, CreatePlanHandler};
pub use deactivate_plan::{DeactivatePlanCommand, DeactivatePlanHandler};

// Queries
pub use get_plan::{GetPlanHandler, GetPlanQuery};
pub use list_plans::{ListPlansHandler, ListPlansQuery};
