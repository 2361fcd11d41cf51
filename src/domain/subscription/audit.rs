//! Append-only audit trail of status changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{AuditEntryId, SubscriptionId, Timestamp, ValidationError};

use super::SubscriptionStatus;

/// Who caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User,
    Admin,
    System,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::User => "user",
            Actor::Admin => "admin",
            Actor::System => "system",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Actor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Actor::User),
            "admin" => Ok(Actor::Admin),
            "system" => Ok(Actor::System),
            other => Err(ValidationError::invalid_format(
                "actor",
                format!("unknown actor '{}'", other),
            )),
        }
    }
}

/// One recorded status change. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub subscription_id: SubscriptionId,
    pub actor: Actor,
    /// User or admin id; absent for system events.
    pub actor_ref: Option<String>,
    pub action: String,
    pub reason: Option<String>,
    /// Absent only for the entry that created the subscription.
    pub before_status: Option<SubscriptionStatus>,
    pub after_status: SubscriptionStatus,
    pub timestamp: Timestamp,
}

impl AuditEntry {
    /// Action recorded when a trial is opened.
    pub const TRIAL_STARTED: &'static str = "trial_started";

    pub fn is_creation(&self) -> bool {
        self.before_status.is_none()
    }
}
