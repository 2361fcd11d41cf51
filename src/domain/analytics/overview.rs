//! Read-only rollups over subscription, audit and payment history.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::foundation::{PlanId, SubscriptionId};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::plan::Plan;
use crate::domain::subscription::{AuditEntry, Subscription, SubscriptionStatus};

use super::{ChurnRate, ReportingWindow};

/// Share of open subscriptions on one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanShare {
    pub plan_id: PlanId,
    pub plan_name: String,
    pub count: u64,
    pub percent: f64,
}

/// Dashboard overview for a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionOverview {
    pub window: ReportingWindow,
    pub active_count: u64,
    pub trial_count: u64,
    pub paused_count: u64,
    pub cancelled_count: u64,
    pub expired_count: u64,
    /// Monthly recurring revenue per currency, in minor units.
    pub mrr: BTreeMap<String, i64>,
    pub churn: ChurnRate,
    pub churn_rate_percent: f64,
    pub plan_distribution: Vec<PlanShare>,
    pub new_subscriptions: u64,
    /// Completed payments created inside the window, per currency.
    pub revenue_in_window: BTreeMap<String, i64>,
}

/// Computes the overview. Pure; inputs are not modified.
///
/// Status counts describe the current snapshot. Churn, new subscriptions
/// and revenue are restricted to `window`.
pub fn compute_overview(
    window: ReportingWindow,
    subscriptions: &[Subscription],
    plans: &[Plan],
    audit: &[AuditEntry],
    payments: &[Payment],
) -> SubscriptionOverview {
    let plans_by_id: HashMap<PlanId, &Plan> = plans.iter().map(|p| (p.id, p)).collect();

    let count = |status: SubscriptionStatus| {
        subscriptions.iter().filter(|s| s.status == status).count() as u64
    };

    let active_at_start = active_at_start(window, audit);
    let churn = ChurnRate::new(
        cancellations_in(window, audit, &active_at_start),
        active_at_start.len() as u64,
    );

    let new_subscriptions = subscriptions
        .iter()
        .filter(|s| window.contains(&s.created_at))
        .count() as u64;

    let mut revenue_in_window: BTreeMap<String, i64> = BTreeMap::new();
    for payment in payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Completed && window.contains(&p.created_at))
    {
        let total = revenue_in_window.entry(payment.currency.clone()).or_insert(0);
        *total = total.saturating_add(payment.amount_minor_units);
    }

    SubscriptionOverview {
        window,
        active_count: count(SubscriptionStatus::Active),
        trial_count: count(SubscriptionStatus::Trial),
        paused_count: count(SubscriptionStatus::Paused),
        cancelled_count: count(SubscriptionStatus::Cancelled),
        expired_count: count(SubscriptionStatus::Expired),
        mrr: monthly_recurring_revenue(subscriptions, &plans_by_id),
        churn_rate_percent: churn.percent(),
        churn,
        plan_distribution: plan_distribution(subscriptions, &plans_by_id),
        new_subscriptions,
        revenue_in_window,
    }
}

/// Sums active plan prices normalised to a month, per currency.
///
/// Prices are first scaled to a yearly amount so the division by twelve
/// happens once, rounded half-up. Totals saturate instead of wrapping.
fn monthly_recurring_revenue(
    subscriptions: &[Subscription],
    plans: &HashMap<PlanId, &Plan>,
) -> BTreeMap<String, i64> {
    let mut yearly: BTreeMap<String, i64> = BTreeMap::new();
    for sub in subscriptions
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
    {
        if let Some(plan) = plans.get(&sub.plan_id) {
            let total = yearly.entry(plan.currency.clone()).or_insert(0);
            *total = total.saturating_add(plan.yearly_price_minor_units());
        }
    }
    yearly
        .into_iter()
        .map(|(currency, total)| (currency, total.saturating_add(6) / 12))
        .collect()
}

/// Cancellations inside the window of subscriptions that were active when
/// it opened. Trials and sign-ups inside the window are not churn.
fn cancellations_in(
    window: ReportingWindow,
    audit: &[AuditEntry],
    active_at_start: &HashSet<SubscriptionId>,
) -> u64 {
    audit
        .iter()
        .filter(|e| {
            e.after_status == SubscriptionStatus::Cancelled
                && e.before_status != Some(SubscriptionStatus::Cancelled)
                && window.contains(&e.timestamp)
                && active_at_start.contains(&e.subscription_id)
        })
        .map(|e| e.subscription_id)
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Subscriptions whose most recent status at or before the window start
/// was `active`.
fn active_at_start(window: ReportingWindow, audit: &[AuditEntry]) -> HashSet<SubscriptionId> {
    let start = window.start();
    let mut latest: HashMap<SubscriptionId, &AuditEntry> = HashMap::new();
    for entry in audit.iter().filter(|e| !e.timestamp.is_after(&start)) {
        match latest.get(&entry.subscription_id) {
            Some(existing) if existing.timestamp.is_after(&entry.timestamp) => {}
            _ => {
                latest.insert(entry.subscription_id, entry);
            }
        }
    }
    latest
        .into_iter()
        .filter(|(_, e)| e.after_status == SubscriptionStatus::Active)
        .map(|(id, _)| id)
        .collect()
}

fn plan_distribution(
    subscriptions: &[Subscription],
    plans: &HashMap<PlanId, &Plan>,
) -> Vec<PlanShare> {
    let open: Vec<&Subscription> = subscriptions.iter().filter(|s| s.status.is_open()).collect();
    let total = open.len() as f64;

    let mut counts: HashMap<PlanId, u64> = HashMap::new();
    for sub in &open {
        *counts.entry(sub.plan_id).or_insert(0) += 1;
    }

    let mut shares: Vec<PlanShare> = counts
        .into_iter()
        .map(|(plan_id, count)| PlanShare {
            plan_id,
            plan_name: plans
                .get(&plan_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| plan_id.to_string()),
            count,
            percent: ((count as f64 * 100.0 / total) * 100.0).round() / 100.0,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.plan_name.cmp(&b.plan_name)));
    shares
}
