//! Unified error handling for the crosspost crate
//!
//! Each domain keeps its own error type; [`Error`] wraps them so that the
//! campaign runner and the commands can cross module boundaries with `?`.
//!
//! # Architecture
//!
//! - [`CrosspostErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust
//! use crosspost::error::{CrosspostErrorTrait, Error, ErrorCategory};
//!
//! let err: Error = anyhow::anyhow!("start_date is required").into();
//! assert_eq!(err.category(), ErrorCategory::Config);
//! assert!(!err.is_recoverable());
//! ```

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::models::ContentError;
pub use crate::scheduler::error::SchedulerError;
pub use crate::storage::LedgerError;
pub use crate::targets::TargetError;

/// Common trait for all crosspost error types
pub trait CrosspostErrorTrait: std::error::Error {
    /// Check if this error may clear up on a later run
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Content set loading and validation
    Content,
    /// Ledger and file I/O
    Storage,
    /// Publishing target errors (HTTP, timeout, rate limit)
    Network,
    /// Configuration and validation errors
    Config,
    /// Scheduler and timing errors
    Scheduler,
}

impl ErrorCategory {
    /// Short human-readable label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content error",
            Self::Storage => "storage error",
            Self::Network => "network error",
            Self::Config => "configuration error",
            Self::Scheduler => "scheduler error",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the crosspost crate
#[derive(Error, Debug)]
pub enum Error {
    /// Content set errors
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Status ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Publishing target errors
    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    /// Scheduler and timing errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl CrosspostErrorTrait for ContentError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Content
    }
}

impl CrosspostErrorTrait for LedgerError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Unavailable(_))
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

impl CrosspostErrorTrait for TargetError {
    fn is_recoverable(&self) -> bool {
        TargetError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::NotConfigured(_) | Self::InvalidConfig(_) => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

impl CrosspostErrorTrait for SchedulerError {
    fn is_recoverable(&self) -> bool {
        SchedulerError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPublishTime { .. }
            | Self::InvalidTimezone { .. }
            | Self::InvalidCadence { .. }
            | Self::ScheduleConfigError { .. } => ErrorCategory::Config,
            _ => ErrorCategory::Scheduler,
        }
    }
}

impl CrosspostErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Content(e) => e.is_recoverable(),
            Self::Ledger(e) => CrosspostErrorTrait::is_recoverable(e),
            Self::Target(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Content(e) => e.category(),
            Self::Ledger(e) => e.category(),
            Self::Target(e) => CrosspostErrorTrait::category(e),
            Self::Scheduler(e) => CrosspostErrorTrait::category(e),
            Self::Io(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

// The library only uses anyhow for configuration loading
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Config(format!("{err:#}"))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_category() {
        let target_err = Error::Target(TargetError::Timeout(Duration::from_secs(5)));
        assert_eq!(target_err.category(), ErrorCategory::Network);

        let content_err = Error::Content(ContentError::Empty);
        assert_eq!(content_err.category(), ErrorCategory::Content);

        let ledger_err = Error::Ledger(LedgerError::LockPoisoned);
        assert_eq!(ledger_err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_is_recoverable() {
        let timeout = Error::Target(TargetError::Timeout(Duration::from_secs(5)));
        assert!(timeout.is_recoverable());

        let content_err = Error::Content(ContentError::DuplicateDay { day: 3 });
        assert!(!content_err.is_recoverable());

        let io = Error::Ledger(LedgerError::Io {
            operation: "rename",
            path: "ledger.json".into(),
            source: io::Error::new(io::ErrorKind::Other, "disk full"),
        });
        assert!(io.is_recoverable());
    }

    #[test]
    fn test_scheduler_config_errors_are_config() {
        let err: Error = SchedulerError::InvalidTimezone { tz: "Mars".into() }.into();
        assert_eq!(err.category(), ErrorCategory::Config);

        let err: Error = SchedulerError::run_failed("boom").into();
        assert_eq!(err.category(), ErrorCategory::Scheduler);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_conversion() {
        let unified: Error = ContentError::Empty.into();
        assert!(matches!(unified, Error::Content(_)));
    }

    #[test]
    fn test_config_loading_error_is_config() {
        let err: Error = anyhow::anyhow!("Invalid timezone: Mars")
            .context("Failed to load config")
            .into();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("Invalid timezone: Mars"));
        assert_eq!(ErrorCategory::Config.to_string(), "configuration error");
    }
}
