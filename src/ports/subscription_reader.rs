//! Subscription reader port (read side / admin queries).

use crate::domain::foundation::{DomainError, PlanId, ValidationError};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Largest page an admin listing may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Reader port for admin listings and analytics input.
#[async_trait]
pub trait SubscriptionReader: Send + Sync {
    /// Filtered, paginated listing ordered by creation time, newest first.
    async fn search(
        &self,
        filter: &SubscriptionFilter,
        page: PageRequest,
    ) -> Result<Page<Subscription>, DomainError>;

    /// Every subscription ever created, for analytics.
    async fn all(&self) -> Result<Vec<Subscription>, DomainError>;
}

/// Admin listing filter. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    pub status: Option<SubscriptionStatus>,
    pub plan_id: Option<PlanId>,
    /// Case-insensitive substring of user id, subscription id or gateway ref.
    pub search: Option<String>,
}

impl SubscriptionFilter {
    /// In-process evaluation of the filter.
    pub fn matches(&self, subscription: &Subscription) -> bool {
        if let Some(status) = self.status {
            if subscription.status != status {
                return false;
            }
        }
        if let Some(plan_id) = self.plan_id {
            if subscription.plan_id != plan_id {
                return false;
            }
        }
        match self.normalized_search() {
            None => true,
            Some(needle) => {
                subscription.user_id.as_str().to_lowercase().contains(&needle)
                    || subscription.id.to_string().contains(&needle)
                    || subscription
                        .gateway_subscription_ref
                        .as_deref()
                        .map(|r| r.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            }
        }
    }

    /// Trimmed, lower-cased search text, or `None` when blank.
    pub fn normalized_search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, ValidationError> {
        if page == 0 {
            return Err(ValidationError::out_of_range("page", 1, i64::from(u32::MAX), 0));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::out_of_range(
                "limit",
                1,
                i64::from(MAX_PAGE_LIMIT),
                i64::from(limit),
            ));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        let limit = u64::from(request.limit());
        Self {
            items,
            total_count,
            total_pages: total_count.div_ceil(limit),
            page: request.page(),
            limit: request.limit(),
        }
    }
}
