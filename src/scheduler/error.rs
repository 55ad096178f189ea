//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Requested day is not part of the content set
    DayNotFound {
        day: u32,
        last_day: u32,
    },

    /// Publish time is not a valid HH:MM value
    InvalidPublishTime {
        value: String,
    },

    /// Unknown IANA timezone name
    InvalidTimezone {
        tz: String,
    },

    /// Unknown cadence name
    InvalidCadence {
        value: String,
    },

    /// Schedule configuration field is invalid
    ScheduleConfigError {
        field: String,
        reason: String,
    },

    /// A scheduled run did not complete
    RunFailed {
        reason: String,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayNotFound { day, last_day } => {
                write!(f, "Day {} not found. Valid days: 1-{}", day, last_day)
            }
            Self::InvalidPublishTime { value } => {
                write!(f, "Invalid publish time '{}'. Expected HH:MM", value)
            }
            Self::InvalidTimezone { tz } => {
                write!(f, "Invalid timezone: {}", tz)
            }
            Self::InvalidCadence { value } => {
                write!(
                    f,
                    "Invalid cadence '{}'. Valid options: daily, every_other_day",
                    value
                )
            }
            Self::ScheduleConfigError { field, reason } => {
                write!(f, "Schedule config error in '{}': {}", field, reason)
            }
            Self::RunFailed { reason } => {
                write!(f, "Scheduled run failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create a day not found error
    pub fn day_not_found(day: u32, last_day: u32) -> Self {
        Self::DayNotFound { day, last_day }
    }

    /// Create a schedule config error
    pub fn schedule_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ScheduleConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a run failure error
    pub fn run_failed(reason: impl Into<String>) -> Self {
        Self::RunFailed {
            reason: reason.into(),
        }
    }

    /// Check if the error is recoverable
    ///
    /// A failed run is retried at the next tick; configuration problems are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RunFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_not_found_error() {
        let err = SchedulerError::day_not_found(31, 30);
        assert!(err.to_string().contains("31"));
        assert!(err.to_string().contains("1-30"));
    }

    #[test]
    fn test_invalid_cadence_error() {
        let err = SchedulerError::InvalidCadence {
            value: "weekly".to_string(),
        };
        assert!(err.to_string().contains("weekly"));
        assert!(err.to_string().contains("every_other_day"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(SchedulerError::run_failed("ledger unavailable").is_recoverable());
        assert!(!SchedulerError::schedule_config("daily_item_count", "zero").is_recoverable());
    }
}
