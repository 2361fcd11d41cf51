//! ListSubscriptionsHandler - Admin listing with filters and pagination.

use std::sync::Arc;

use crate::domain::subscription::{Subscription, SubscriptionError};
use crate::ports::{Page, PageRequest, SubscriptionFilter, SubscriptionReader};

#[derive(Debug, Clone, Default)]
pub struct ListSubscriptionsQuery {
    pub filter: SubscriptionFilter,
    /// One-based.
    pub page: u32,
    pub limit: u32,
}

pub struct ListSubscriptionsHandler {
    reader: Arc<dyn SubscriptionReader>,
}

impl ListSubscriptionsHandler {
    pub fn new(reader: Arc<dyn SubscriptionReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: ListSubscriptionsQuery,
    ) -> Result<Page<Subscription>, SubscriptionError> {
        let page = PageRequest::new(query.page, query.limit)?;
        Ok(self.reader.search(&query.filter, page).await?)
    }
}
