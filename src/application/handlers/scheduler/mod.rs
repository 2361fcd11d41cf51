//! Scheduler handlers.
//!
//! ## Commands
//! - Running one expiry sweep (timer loop or external cron)

mod expiry_sweep;

pub use expiry_sweep::{
    ExpirySweepHandler, RunExpirySweepCommand, SweepFailure, SweepFailureView, SweepReport,
    SweepReportView,
};
