//! Plan catalog port.
//!
//! Plans are append-only. There is deliberately no update method: a price
//! change is a new plan plus `deactivate` on the old one.

use crate::domain::foundation::{DomainError, PlanId};
use crate::domain::plan::Plan;
use async_trait::async_trait;

/// Repository port for the plan catalog.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Append a new plan.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the id is already taken
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, plan: &Plan) -> Result<(), DomainError>;

    /// Find a plan by id, active or not.
    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError>;

    /// List plans ordered by price, optionally hiding deactivated ones.
    async fn list(&self, active_only: bool) -> Result<Vec<Plan>, DomainError>;

    /// Hide a plan from active listings.
    ///
    /// Returns `false` if no plan has this id.
    async fn deactivate(&self, id: &PlanId) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PlanRepository) {}
    }
}
