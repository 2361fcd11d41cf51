//! PostgreSQL implementation of SubscriptionReader (admin listing, analytics input).

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::rows::{db_error, like_pattern, SubscriptionRow, SUBSCRIPTION_COLUMNS};
use crate::domain::foundation::DomainError;
use crate::domain::subscription::Subscription;
use crate::ports::{Page, PageRequest, SubscriptionFilter, SubscriptionReader};

pub struct PostgresSubscriptionReader {
    pool: PgPool,
}

impl PostgresSubscriptionReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the WHERE clause for `filter`. Matches `SubscriptionFilter::matches`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &SubscriptionFilter) {
    builder.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(plan_id) = filter.plan_id {
        builder.push(" AND plan_id = ").push_bind(*plan_id.as_uuid());
    }
    if let Some(needle) = filter.normalized_search() {
        let pattern = like_pattern(&needle);
        builder
            .push(" AND (LOWER(user_id) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR id::text LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(gateway_subscription_ref, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl SubscriptionReader for PostgresSubscriptionReader {
    async fn search(
        &self,
        filter: &SubscriptionFilter,
        page: PageRequest,
    ) -> Result<Page<Subscription>, DomainError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM subscriptions");
        push_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count subscriptions"))?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM subscriptions", SUBSCRIPTION_COLUMNS));
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let rows: Vec<SubscriptionRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("search subscriptions"))?;

        let items = rows
            .into_iter()
            .map(Subscription::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    async fn all(&self) -> Result<Vec<Subscription>, DomainError> {
        let sql = format!(
            "SELECT {} FROM subscriptions ORDER BY created_at",
            SUBSCRIPTION_COLUMNS
        );
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("load subscriptions"))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PlanId;
    use crate::domain::subscription::SubscriptionStatus;

    #[test]
    fn empty_filter_has_no_conditions() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM subscriptions");
        push_filter(&mut builder, &SubscriptionFilter::default());
        assert_eq!(builder.sql(), "SELECT 1 FROM subscriptions WHERE TRUE");
    }

    #[test]
    fn full_filter_binds_every_condition() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM subscriptions");
        push_filter(
            &mut builder,
            &SubscriptionFilter {
                status: Some(SubscriptionStatus::Paused),
                plan_id: Some(PlanId::new()),
                search: Some("  Learner ".to_string()),
            },
        );
        let sql = builder.sql();
        assert!(sql.contains("status = $1"));
        assert!(sql.contains("plan_id = $2"));
        assert!(sql.contains("LOWER(user_id) LIKE $3"));
        assert!(sql.contains("gateway_subscription_ref, '')) LIKE $5"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM subscriptions");
        push_filter(
            &mut builder,
            &SubscriptionFilter {
                search: Some("   ".to_string()),
                ..Default::default()
            },
        );
        assert!(!builder.sql().contains("LIKE"));
    }
}
