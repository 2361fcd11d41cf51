//! Subscription-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | PlanNotFound / SubscriptionNotFound / NoSubscriptionForUser | 404 |
//! | IllegalTransition | 409 |
//! | OpenSubscriptionExists | 409 |
//! | ConcurrentModification | 409 |
//! | OverrideRejected | 422 |
//! | Verification | 400 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 500 |

use std::fmt;

use crate::domain::foundation::{
    DomainError, ErrorCode, PlanId, SubscriptionId, Timestamp, UserId, ValidationError,
};
use crate::domain::payment::VerificationError;

use super::SubscriptionStatus;

/// Guard violated by an admin override. Reported verbatim to the admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideGuard {
    /// Reason was empty or whitespace.
    MissingReason,

    /// Target plan id does not resolve.
    UnknownPlan(PlanId),

    /// Reopening would give the user a second open subscription.
    OpenSubscriptionExists,

    /// Requested end date would move an open period backwards.
    PeriodEndRegression {
        current: Timestamp,
        requested: Timestamp,
    },
}

impl OverrideGuard {
    /// Stable identifier for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            OverrideGuard::MissingReason => "missing_reason",
            OverrideGuard::UnknownPlan(_) => "unknown_plan",
            OverrideGuard::OpenSubscriptionExists => "open_subscription_exists",
            OverrideGuard::PeriodEndRegression { .. } => "period_end_regression",
        }
    }
}

impl fmt::Display for OverrideGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideGuard::MissingReason => write!(f, "a reason is required"),
            OverrideGuard::UnknownPlan(id) => write!(f, "plan {} does not exist", id),
            OverrideGuard::OpenSubscriptionExists => {
                write!(f, "the user already has another open subscription")
            }
            OverrideGuard::PeriodEndRegression { current, requested } => write!(
                f,
                "end date {} is before the current period end {}",
                requested.as_datetime().to_rfc3339(),
                current.as_datetime().to_rfc3339()
            ),
        }
    }
}

/// Errors surfaced by subscription, payment and admin operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    PlanNotFound(PlanId),

    SubscriptionNotFound(SubscriptionId),

    NoSubscriptionForUser(UserId),

    /// Event not valid for the current status.
    IllegalTransition {
        subscription_id: SubscriptionId,
        from: SubscriptionStatus,
        event: &'static str,
    },

    OverrideRejected(OverrideGuard),

    OpenSubscriptionExists(UserId),

    /// Optimistic version check kept losing.
    ConcurrentModification(SubscriptionId),

    Verification(VerificationError),

    ValidationFailed { field: String, message: String },

    Infrastructure(String),
}

impl SubscriptionError {
    pub fn illegal_transition(
        subscription_id: SubscriptionId,
        from: SubscriptionStatus,
        event: &'static str,
    ) -> Self {
        SubscriptionError::IllegalTransition {
            subscription_id,
            from,
            event,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        SubscriptionError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            SubscriptionError::SubscriptionNotFound(_)
            | SubscriptionError::NoSubscriptionForUser(_) => ErrorCode::SubscriptionNotFound,
            SubscriptionError::IllegalTransition { .. } => ErrorCode::InvalidStateTransition,
            SubscriptionError::OverrideRejected(_) => ErrorCode::OverrideRejected,
            SubscriptionError::OpenSubscriptionExists(_) => ErrorCode::OpenSubscriptionExists,
            SubscriptionError::ConcurrentModification(_) => ErrorCode::ConcurrentModification,
            SubscriptionError::Verification(_) => ErrorCode::PaymentNotConfirmed,
            SubscriptionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Detailed message for logs and trusted callers.
    pub fn message(&self) -> String {
        match self {
            SubscriptionError::PlanNotFound(id) => format!("Plan not found: {}", id),
            SubscriptionError::SubscriptionNotFound(id) => {
                format!("Subscription not found: {}", id)
            }
            SubscriptionError::NoSubscriptionForUser(user_id) => {
                format!("No subscription found for user: {}", user_id)
            }
            SubscriptionError::IllegalTransition {
                subscription_id,
                from,
                event,
            } => format!(
                "Event '{}' is not allowed for subscription {} in state {}",
                event, subscription_id, from
            ),
            SubscriptionError::OverrideRejected(guard) => {
                format!("Override rejected: {}", guard)
            }
            SubscriptionError::OpenSubscriptionExists(user_id) => {
                format!("User {} already has an open subscription", user_id)
            }
            SubscriptionError::ConcurrentModification(id) => format!(
                "Subscription {} was modified concurrently; retries exhausted",
                id
            ),
            SubscriptionError::Verification(err) => format!("Payment verification failed: {}", err),
            SubscriptionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SubscriptionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Verification failures collapse to one generic text so callers cannot
    /// tell a bad signature from a malformed payload.
    pub fn user_message(&self) -> String {
        match self {
            SubscriptionError::Verification(err) => err.user_message().to_string(),
            SubscriptionError::Infrastructure(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            other => other.message(),
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubscriptionError::ConcurrentModification(_) | SubscriptionError::Infrastructure(_)
        )
    }
}

impl fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubscriptionError {}

impl From<VerificationError> for SubscriptionError {
    fn from(err: VerificationError) -> Self {
        SubscriptionError::Verification(err)
    }
}

impl From<ValidationError> for SubscriptionError {
    fn from(err: ValidationError) -> Self {
        SubscriptionError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        let detail = |key: &str| err.details.get(key).cloned();
        match err.code {
            ErrorCode::OpenSubscriptionExists => {
                match detail("user_id").and_then(|u| UserId::new(u).ok()) {
                    Some(user_id) => SubscriptionError::OpenSubscriptionExists(user_id),
                    None => SubscriptionError::Infrastructure(err.to_string()),
                }
            }
            ErrorCode::ConcurrentModification => {
                match detail("subscription_id").and_then(|id| id.parse().ok()) {
                    Some(id) => SubscriptionError::ConcurrentModification(id),
                    None => SubscriptionError::Infrastructure(err.to_string()),
                }
            }
            ErrorCode::ValidationFailed => SubscriptionError::ValidationFailed {
                field: detail("field").unwrap_or_else(|| "unknown".to_string()),
                message: err.message.clone(),
            },
            _ => SubscriptionError::Infrastructure(err.to_string()),
        }
    }
}

impl From<SubscriptionError> for DomainError {
    fn from(err: SubscriptionError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
