//! crosspost - scheduled multi-target publishing
//!
//! Publishes a fixed, numbered content set to many independent targets over a
//! multi-week campaign. Each (item, target) pair is published at most once,
//! even across interrupted or repeated runs, and missed days are caught up.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`] - Content items and the validated content set
//! - [`scheduler`] - Date resolution, due-set selection and the daily loop
//! - [`storage`] - Durable status ledger
//! - [`targets`] - Publish capabilities and their registry
//! - [`dispatch`] - Per-item fan-out with per-target failure isolation
//! - [`runner`] - Campaign runs tying the pieces together
//! - [`report`] - Per-day status report
//! - [`config`] - Configuration management and settings
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use crosspost::config::Config;
//! use crosspost::runner::Campaign;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let campaign = Campaign::from_config(&config)?;
//!     let summary = campaign.run_due(campaign.today()).await?;
//!     println!("{} item(s) dispatched", summary.dispatched());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod storage;
pub mod targets;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dispatch::{DispatchResult, Dispatcher};
    pub use crate::error::{CrosspostErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{ContentItem, ContentSet};
    pub use crate::runner::Campaign;
    pub use crate::scheduler::{Cadence, ScheduleConfig};
    pub use crate::storage::{PublicationRecord, StatusLedger};
    pub use crate::targets::{PublishTarget, TargetRegistry};
}

// Direct re-exports for convenience
pub use models::{ContentItem, ContentSet};
