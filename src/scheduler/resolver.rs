//! Schedule resolution
//!
//! Maps a campaign day number to the calendar date it is due on. Several
//! days share one calendar date (`daily_item_count`), and the cadence decides
//! whether consecutive dates are one or two calendar days apart.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{SchedulerError, SchedulerResult};
use crate::models::ContentSet;

/// How often a new batch of items becomes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Every calendar day
    #[default]
    Daily,
    /// Every second calendar day
    EveryOtherDay,
}

impl Cadence {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::EveryOtherDay => "every_other_day",
        }
    }

    /// Calendar days between two consecutive batches
    pub fn step_days(&self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::EveryOtherDay => 2,
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "daily" => Ok(Self::Daily),
            "every_other_day" => Ok(Self::EveryOtherDay),
            _ => Err(SchedulerError::InvalidCadence {
                value: s.to_string(),
            }),
        }
    }
}

/// Validated, immutable schedule parameters for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Calendar date of day 1
    pub start_date: NaiveDate,

    /// Batch cadence
    pub cadence: Cadence,

    /// Number of consecutive days that share one calendar date
    pub daily_item_count: u32,

    /// Local wall-clock time the daemon wakes at
    pub publish_time: NaiveTime,

    /// Timezone used for "today" and the daemon wake time
    pub timezone: Tz,
}

impl ScheduleConfig {
    /// Create a schedule with two items per date, 09:00 in US Eastern time
    pub fn new(start_date: NaiveDate, cadence: Cadence) -> Self {
        Self {
            start_date,
            cadence,
            daily_item_count: 2,
            publish_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            timezone: chrono_tz::America::New_York,
        }
    }

    /// Set the number of items sharing one date
    pub fn with_daily_item_count(mut self, count: u32) -> Self {
        self.daily_item_count = count;
        self
    }

    /// Set the daemon publish time
    pub fn with_publish_time(mut self, time: NaiveTime) -> Self {
        self.publish_time = time;
        self
    }

    /// Set the timezone
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.daily_item_count == 0 {
            return Err(SchedulerError::schedule_config(
                "daily_item_count",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Calendar date `day` is due on
    ///
    /// # Panics
    ///
    /// Panics if `day` is 0; day numbers start at 1.
    pub fn resolve(&self, day: u32) -> NaiveDate {
        resolve(day, self)
    }

    /// Today's date in the configured timezone
    pub fn today(&self) -> NaiveDate {
        self.local_date(Utc::now())
    }

    /// Date of an instant in the configured timezone
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }
}

/// Resolve the calendar date for a campaign day
///
/// # Panics
///
/// Panics if `day` is 0 or `daily_item_count` is 0.
pub fn resolve(day: u32, config: &ScheduleConfig) -> NaiveDate {
    assert!(day >= 1, "day numbers start at 1, got {day}");
    assert!(config.daily_item_count > 0, "daily_item_count must be positive");

    let batch = i64::from((day - 1) / config.daily_item_count);
    config.start_date + Duration::days(batch * config.cadence.step_days())
}

/// One line of the campaign calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub day: u32,
    pub date: NaiveDate,
    pub title: String,
    pub targets: Vec<String>,
}

/// Full campaign calendar
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSchedule {
    pub start_date: NaiveDate,
    pub cadence: Cadence,
    pub entries: Vec<ScheduleEntry>,
    pub end_date: NaiveDate,
}

impl CampaignSchedule {
    /// Build the calendar for every item in the content set
    pub fn build(content: &ContentSet, config: &ScheduleConfig) -> Self {
        let entries = content
            .items()
            .iter()
            .map(|item| ScheduleEntry {
                day: item.day,
                date: config.resolve(item.day),
                title: item.title.clone(),
                targets: item.targets.clone(),
            })
            .collect();

        Self {
            start_date: config.start_date,
            cadence: config.cadence,
            entries,
            end_date: config.resolve(content.last_day()),
        }
    }

    /// Format as display string
    pub fn display(&self) -> String {
        let mut output = String::from("Publishing Schedule\n");
        output.push_str(&format!(
            "Start: {} | Cadence: {}\n",
            self.start_date, self.cadence
        ));
        output.push_str(&format!("{:-<60}\n", ""));

        for entry in &self.entries {
            output.push_str(&format!(
                "Day {:02} | {} | {:<24} | {}\n",
                entry.day,
                entry.date.format("%a, %b %d %Y"),
                entry.targets.join(","),
                entry.title
            ));
        }

        output.push_str(&format!(
            "\nCampaign ends: {}\n",
            self.end_date.format("%A, %b %d %Y")
        ));
        output
    }
}
