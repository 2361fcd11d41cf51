//! Subscription handlers.
//!
//! ## Commands
//! - Starting a trial
//! - Learner cancellation
//! - Gateway pause
//!
//! ## Queries
//! - Access check
//!
//! All state changes run through `TransitionExecutor`.

mod cancel_subscription;
mod check_access;
mod pause_subscription;
mod start_trial;
mod transition_executor;

// Commands
pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use pause_subscription::{PauseSubscriptionCommand, PauseSubscriptionHandler};
pub use start_trial::{StartTrialCommand, StartTrialHandler, StartTrialResult};

// Queries
pub use check_access::{AccessSummary, CheckAccessHandler, CheckAccessQuery, CheckAccessResult};

// Shared
pub use transition_executor::{
    Decision, ExecutionOutcome, TransitionExecutor, MAX_TRANSITION_ATTEMPTS,
};
