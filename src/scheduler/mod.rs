//! Campaign scheduling
//!
//! # Modules
//!
//! - [`resolver`] - Day number to calendar date mapping and the campaign calendar
//! - [`due`] - Due-set selection with catch-up of missed days
//! - [`trigger`] - Daily scheduler loop
//! - [`error`] - Scheduler error types
//!
//! # Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use crosspost::scheduler::{Cadence, ScheduleConfig};
//!
//! let start = NaiveDate::from_ymd_opt(2026, 2, 11).unwrap();
//! let config = ScheduleConfig::new(start, Cadence::EveryOtherDay);
//!
//! assert_eq!(config.resolve(3), NaiveDate::from_ymd_opt(2026, 2, 13).unwrap());
//! ```

pub mod due;
pub mod error;
pub mod resolver;
pub mod trigger;

pub use due::{select_due, DueSet};
pub use error::{SchedulerError, SchedulerResult};
pub use resolver::{resolve, Cadence, CampaignSchedule, ScheduleConfig, ScheduleEntry};
pub use trigger::{PublishTrigger, ScheduledJob, TriggerEvent, TriggerState, TriggerStatus};
