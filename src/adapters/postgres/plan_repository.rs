//! PostgreSQL implementation of PlanRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{db_error, PlanRow};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId};
use crate::domain::plan::Plan;
use crate::ports::PlanRepository;

/// Plan catalog backed by the `plans` table.
///
/// Rows are never updated apart from the `active` flag.
pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn insert(&self, plan: &Plan) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO plans (
                id, name, price_minor_units, currency, billing_period, features, active, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.name)
        .bind(plan.price_minor_units)
        .bind(&plan.currency)
        .bind(plan.billing_period.as_str())
        .bind(&plan.features)
        .bind(plan.active)
        .bind(plan.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("plans_pkey") {
                    return DomainError::new(ErrorCode::ValidationFailed, "plan id already exists")
                        .with_detail("field", "id");
                }
            }
            db_error("insert plan")(e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, name, price_minor_units, currency, billing_period, features, active, created_at
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("load plan"))?;

        row.map(Plan::try_from).transpose()
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Plan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, name, price_minor_units, currency, billing_period, features, active, created_at
            FROM plans
            WHERE active OR NOT $1
            ORDER BY price_minor_units, name
            "#,
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list plans"))?;

        rows.into_iter().map(Plan::try_from).collect()
    }

    async fn deactivate(&self, id: &PlanId) -> Result<bool, DomainError> {
        let result = sqlx::query("UPDATE plans SET active = FALSE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_error("deactivate plan"))?;

        Ok(result.rows_affected() > 0)
    }
}
