//! Reporting window and churn rate value objects.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

/// Half-open interval `[start, end)` over which analytics are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    start: Timestamp,
    end: Timestamp,
}

impl ReportingWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if !start.is_before(&end) {
            return Err(ValidationError::invalid_format(
                "window",
                "start must be before end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Window covering the `days` days that end at `end`.
    pub fn trailing_days(end: Timestamp, days: u32) -> Result<Self, ValidationError> {
        if days == 0 {
            return Err(ValidationError::out_of_range("days", 1, 3650, 0));
        }
        Self::new(end.add_days(-i64::from(days)), end)
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn contains(&self, ts: &Timestamp) -> bool {
        !ts.is_before(&self.start) && ts.is_before(&self.end)
    }
}

/// Churn as an explicit numerator and denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnRate {
    pub cancellations: u64,
    pub active_at_window_start: u64,
}

impl ChurnRate {
    pub fn new(cancellations: u64, active_at_window_start: u64) -> Self {
        Self {
            cancellations,
            active_at_window_start,
        }
    }

    /// Percentage rounded to two decimals. Zero when nothing was active.
    pub fn percent(&self) -> f64 {
        if self.active_at_window_start == 0 {
            return 0.0;
        }
        let raw = self.cancellations as f64 * 100.0 / self.active_at_window_start as f64;
        (raw * 100.0).round() / 100.0
    }
}
