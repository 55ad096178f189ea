//! Publication state persistence
//!
//! This module holds the status ledger, the only shared mutable state of the
//! engine, and the stores it can be backed by.
//!
//! # Example
//!
//! ```no_run
//! use crosspost::storage::StatusLedger;
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let ledger = StatusLedger::open(Path::new("logs/publish_status.json"))?;
//!
//! let mut done = BTreeMap::new();
//! done.insert("devto".to_string(), "https://dev.to/me/post".to_string());
//! ledger.merge(1, &done)?;
//!
//! assert!(ledger.get(1)?.is_done("devto"));
//! # Ok(())
//! # }
//! ```

pub mod ledger;
pub mod store;

use thiserror::Error;

pub use ledger::{LedgerDocument, PublicationRecord, StatusLedger};
pub use store::{JsonFileStore, LedgerStore, MemoryStore};

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised by the status ledger and its stores
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Filesystem operation failed
    #[error("Ledger I/O error during '{operation}' on {path}: {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored document cannot be parsed
    #[error("Ledger file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document cannot be serialized
    #[error("Ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A thread panicked while holding the ledger lock
    #[error("Ledger lock poisoned")]
    LockPoisoned,

    /// The backing store refused the operation
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),
}
