//! Subscription status state machine.
//!
//! Every view renders status through [`SubscriptionStatus::label`] and
//! [`SubscriptionStatus::badge_tone`], so admin and learner screens can
//! never disagree about what a status looks like.

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Free, time-boxed access before the first payment.
    Trial,

    /// Paid and within the current period.
    Active,

    /// Gateway retry window. No access.
    Paused,

    /// Cancelled by the learner or an admin. Terminal.
    Cancelled,

    /// Trial or paid period elapsed without renewal.
    Expired,
}

/// Colour family used when rendering a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Success,
    Info,
    Warning,
    Danger,
    Neutral,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 5] = [
        SubscriptionStatus::Trial,
        SubscriptionStatus::Active,
        SubscriptionStatus::Paused,
        SubscriptionStatus::Cancelled,
        SubscriptionStatus::Expired,
    ];

    /// Storage and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "Free trial",
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Paused => "Paused",
            SubscriptionStatus::Cancelled => "Cancelled",
            SubscriptionStatus::Expired => "Expired",
        }
    }

    pub fn badge_tone(&self) -> BadgeTone {
        match self {
            SubscriptionStatus::Trial => BadgeTone::Info,
            SubscriptionStatus::Active => BadgeTone::Success,
            SubscriptionStatus::Paused => BadgeTone::Warning,
            SubscriptionStatus::Cancelled => BadgeTone::Danger,
            SubscriptionStatus::Expired => BadgeTone::Neutral,
        }
    }

    /// Open subscriptions count towards the one-per-user limit.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Trial | SubscriptionStatus::Active | SubscriptionStatus::Paused
        )
    }

    /// Returns true if the status itself permits access.
    ///
    /// Callers must still check the period end; see `Subscription::has_access`.
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Trial | SubscriptionStatus::Active)
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From TRIAL
            (Trial, Active)
                | (Trial, Expired)
                | (Trial, Cancelled)
            // From ACTIVE
                | (Active, Active) // Renewal
                | (Active, Expired)
                | (Active, Cancelled)
                | (Active, Paused)
            // From PAUSED
                | (Paused, Active)
            // From EXPIRED
                | (Expired, Active) // Late payment
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|target| self.can_transition_to(target))
            .collect()
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ValidationError::invalid_format("status", format!("unknown status '{}'", s))
            })
    }
}
