use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// How a drop-off date earlier than the pickup date is treated.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationMode {
    /// Reversed ranges are priced on their absolute length.
    #[default]
    Lenient,
    /// Reversed ranges are rejected during form validation.
    Strict,
}

impl fmt::Display for DurationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationMode::Lenient => write!(f, "lenient"),
            DurationMode::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for DurationMode {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lenient" => Ok(DurationMode::Lenient),
            "strict" => Ok(DurationMode::Strict),
            other => Err(DurationError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DurationError {
    #[error("End date must not be before start date")]
    ReversedRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Unknown duration mode '{0}', expected 'lenient' or 'strict'")]
    UnknownMode(String),
}

/// Rental days between two instants: the absolute difference rounded up to
/// whole days, never less than one. A missing date counts as one day.
pub fn duration_days(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> i64 {
    let (Some(start), Some(end)) = (start, end) else {
        return 1;
    };

    let millis = (end - start).num_milliseconds().abs();
    // ceil for non-negative integers
    let days = (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY;
    days.max(1)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DurationCalculator {
    mode: DurationMode,
}

impl DurationCalculator {
    pub fn new(mode: DurationMode) -> Self {
        Self { mode }
    }

    pub fn duration_days(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> i64 {
        duration_days(start, end)
    }

    /// Applies the range-order policy. Always `Ok` in lenient mode.
    pub fn check_order(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<(), DurationError> {
        match (self.mode, start, end) {
            (DurationMode::Strict, Some(start), Some(end)) if end < start => {
                Err(DurationError::ReversedRange { start, end })
            }
            _ => Ok(()),
        }
    }
}
