//! In-memory implementation of every billing port.
//!
//! One lock guards all tables so a transition commit is atomic exactly
//! like the Postgres transaction. Used by tests and by local runs without
//! a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::foundation::{
    DomainError, ErrorCode, PlanId, SubscriptionId, Timestamp, UserId,
};
use crate::domain::payment::Payment;
use crate::domain::plan::Plan;
use crate::domain::subscription::{AuditEntry, Subscription};
use crate::ports::{
    AuditLog, CommitOutcome, Page, PageRequest, PaymentRepository, PlanRepository,
    SubscriptionFilter, SubscriptionReader, SubscriptionRepository, TransitionCommit,
};

#[derive(Default)]
struct Tables {
    plans: Vec<Plan>,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    payments: Vec<Payment>,
    audit: Vec<AuditEntry>,
}

impl Tables {
    fn open_for_user(&self, user_id: &UserId) -> Option<&Subscription> {
        self.subscriptions
            .values()
            .find(|s| &s.user_id == user_id && s.status.is_open())
    }
}

/// Thread-safe in-process store.
#[derive(Default)]
pub struct InMemoryBillingStore {
    tables: RwLock<Tables>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Number of stored payment rows.
    pub fn payment_count(&self) -> usize {
        self.read().map(|t| t.payments.len()).unwrap_or(0)
    }

    /// Number of stored audit entries across all subscriptions.
    pub fn audit_count(&self) -> usize {
        self.read().map(|t| t.audit.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DomainError> {
        self.tables
            .read()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "billing store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DomainError> {
        self.tables
            .write()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "billing store lock poisoned"))
    }
}

fn open_subscription_exists(user_id: &UserId) -> DomainError {
    DomainError::new(
        ErrorCode::OpenSubscriptionExists,
        "user already has an open subscription",
    )
    .with_detail("user_id", user_id.as_str())
}

#[async_trait]
impl PlanRepository for InMemoryBillingStore {
    async fn insert(&self, plan: &Plan) -> Result<(), DomainError> {
        let mut tables = self.write()?;
        if tables.plans.iter().any(|p| p.id == plan.id) {
            return Err(DomainError::new(ErrorCode::ValidationFailed, "plan id already exists")
                .with_detail("field", "id"));
        }
        tables.plans.push(plan.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        Ok(self.read()?.plans.iter().find(|p| &p.id == id).cloned())
    }

    async fn list(&self, active_only: bool) -> Result<Vec<Plan>, DomainError> {
        let mut plans: Vec<Plan> = self
            .read()?
            .plans
            .iter()
            .filter(|p| !active_only || p.active)
            .cloned()
            .collect();
        plans.sort_by(|a, b| {
            a.price_minor_units
                .cmp(&b.price_minor_units)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(plans)
    }

    async fn deactivate(&self, id: &PlanId) -> Result<bool, DomainError> {
        let mut tables = self.write()?;
        match tables.plans.iter_mut().find(|p| &p.id == id) {
            Some(plan) => {
                plan.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryBillingStore {
    async fn create(
        &self,
        subscription: &Subscription,
        audit_entry: &AuditEntry,
    ) -> Result<(), DomainError> {
        let mut tables = self.write()?;
        if subscription.status.is_open() && tables.open_for_user(&subscription.user_id).is_some() {
            return Err(open_subscription_exists(&subscription.user_id));
        }
        tables
            .subscriptions
            .insert(subscription.id, subscription.clone());
        tables.audit.push(audit_entry.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.read()?.subscriptions.get(id).cloned())
    }

    async fn find_open_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self.read()?.open_for_user(user_id).cloned())
    }

    async fn find_latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .read()?
            .subscriptions
            .values()
            .filter(|s| &s.user_id == user_id)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn commit_transition(
        &self,
        commit: TransitionCommit,
    ) -> Result<CommitOutcome, DomainError> {
        let mut tables = self.write()?;

        if let Some(payment) = &commit.payment {
            if let Some(existing) = tables
                .payments
                .iter()
                .find(|p| p.gateway_payment_ref == payment.gateway_payment_ref)
            {
                return Ok(CommitOutcome::DuplicatePayment(existing.clone()));
            }
        }

        let next = commit.subscription;
        let stored = tables.subscriptions.get(&next.id).ok_or_else(|| {
            DomainError::new(ErrorCode::SubscriptionNotFound, "subscription not found")
                .with_detail("subscription_id", next.id.to_string())
        })?;
        if stored.version != commit.expected_version {
            return Ok(CommitOutcome::VersionConflict);
        }
        if next.status.is_open() && !stored.status.is_open() {
            if let Some(other) = tables.open_for_user(&next.user_id) {
                if other.id != next.id {
                    return Err(open_subscription_exists(&next.user_id));
                }
            }
        }

        tables.subscriptions.insert(next.id, next);
        tables.audit.push(commit.audit_entry);
        if let Some(payment) = commit.payment {
            tables.payments.push(payment);
        }
        Ok(CommitOutcome::Committed)
    }

    async fn find_due_for_expiry(
        &self,
        now: Timestamp,
        limit: u32,
    ) -> Result<Vec<Subscription>, DomainError> {
        let mut due: Vec<Subscription> = self
            .read()?
            .subscriptions
            .values()
            .filter(|s| s.is_due_for_expiry(now))
            .cloned()
            .collect();
        due.sort_by_key(|s| s.current_period_end);
        due.truncate(limit as usize);
        Ok(due)
    }
}

#[async_trait]
impl SubscriptionReader for InMemoryBillingStore {
    async fn search(
        &self,
        filter: &SubscriptionFilter,
        page: PageRequest,
    ) -> Result<Page<Subscription>, DomainError> {
        let mut matching: Vec<Subscription> = self
            .read()?
            .subscriptions
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(Page::new(items, total, page))
    }

    async fn all(&self) -> Result<Vec<Subscription>, DomainError> {
        Ok(self.read()?.subscriptions.values().cloned().collect())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryBillingStore {
    async fn find_by_gateway_ref(
        &self,
        gateway_payment_ref: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .read()?
            .payments
            .iter()
            .find(|p| p.gateway_payment_ref == gateway_payment_ref)
            .cloned())
    }

    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<Payment>, DomainError> {
        Ok(self
            .read()?
            .payments
            .iter()
            .filter(|p| &p.subscription_id == subscription_id)
            .cloned()
            .collect())
    }

    async fn list_created_between(
        &self,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<Payment>, DomainError> {
        Ok(self
            .read()?
            .payments
            .iter()
            .filter(|p| !p.created_at.is_before(&from) && p.created_at.is_before(&to))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditLog for InMemoryBillingStore {
    async fn history(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Vec<AuditEntry>, DomainError> {
        Ok(self
            .read()?
            .audit
            .iter()
            .filter(|e| &e.subscription_id == subscription_id)
            .cloned()
            .collect())
    }

    async fn entries_until(&self, until: Timestamp) -> Result<Vec<AuditEntry>, DomainError> {
        Ok(self
            .read()?
            .audit
            .iter()
            .filter(|e| e.timestamp.is_before(&until))
            .cloned()
            .collect())
    }
}
