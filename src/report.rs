//! Campaign status report
//!
//! Combines the content set, a ledger snapshot and the calendar into a
//! per-day view: publication state (not started, partial, complete) and
//! calendar position (past, today, upcoming).

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{ContentItem, ContentSet};
use crate::scheduler::ScheduleConfig;
use crate::storage::LedgerDocument;
use crate::utils::truncate_text;

/// Publication state of one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PublicationState {
    /// No target has succeeded
    NotStarted,
    /// Some targets succeeded
    Partial {
        done: Vec<String>,
        pending: Vec<String>,
    },
    /// Every configured target succeeded
    Complete,
}

impl PublicationState {
    fn of(item: &ContentItem, ledger: &LedgerDocument) -> Self {
        let record = ledger.record(item.day);
        if record.is_complete_for(item) {
            return Self::Complete;
        }

        let done: Vec<String> = record.done_for(item).into_iter().map(str::to_string).collect();
        if done.is_empty() {
            Self::NotStarted
        } else {
            Self::Partial {
                done,
                pending: record.pending_for(item).into_iter().map(str::to_string).collect(),
            }
        }
    }

    /// Check if fully published
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Calendar position of a day relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Past,
    Today,
    Upcoming,
}

impl Timing {
    fn of(date: NaiveDate, today: NaiveDate) -> Self {
        match date.cmp(&today) {
            std::cmp::Ordering::Less => Self::Past,
            std::cmp::Ordering::Equal => Self::Today,
            std::cmp::Ordering::Greater => Self::Upcoming,
        }
    }
}

/// Status of one campaign day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayStatus {
    pub day: u32,
    pub date: NaiveDate,
    pub title: String,
    pub targets: Vec<String>,
    pub state: PublicationState,
    pub timing: Timing,
    pub locations: BTreeMap<String, String>,
}

impl DayStatus {
    /// Past its date and not fully published
    pub fn is_overdue(&self) -> bool {
        self.timing == Timing::Past && !self.state.is_complete()
    }

    fn marker(&self) -> &'static str {
        match (&self.state, self.timing) {
            (PublicationState::Complete, _) => "[done]   ",
            (_, Timing::Past) => "[overdue]",
            (_, Timing::Today) => "[today]  ",
            (PublicationState::Partial { .. }, Timing::Upcoming) => "[partial]",
            (PublicationState::NotStarted, Timing::Upcoming) => "[ ]      ",
        }
    }
}

/// Whole-campaign status
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub today: NaiveDate,
    pub days: Vec<DayStatus>,
    pub total: usize,
    pub complete: usize,
    pub partial: usize,
    pub not_started: usize,
    pub overdue: usize,
}

impl StatusReport {
    /// Build the report for `today`
    pub fn build(
        content: &ContentSet,
        ledger: &LedgerDocument,
        config: &ScheduleConfig,
        today: NaiveDate,
    ) -> Self {
        let days: Vec<DayStatus> = content
            .items()
            .iter()
            .map(|item| {
                let date = config.resolve(item.day);
                let record = ledger.record(item.day);
                DayStatus {
                    day: item.day,
                    date,
                    title: item.title.clone(),
                    targets: item.targets.clone(),
                    state: PublicationState::of(item, ledger),
                    timing: Timing::of(date, today),
                    locations: record.locations,
                }
            })
            .collect();

        let count = |f: fn(&DayStatus) -> bool| days.iter().filter(|d| f(d)).count();
        let complete = count(|d| d.state.is_complete());
        let partial = count(|d| matches!(d.state, PublicationState::Partial { .. }));
        let not_started = count(|d| d.state == PublicationState::NotStarted);
        let overdue = count(DayStatus::is_overdue);

        Self {
            today,
            total: days.len(),
            days,
            complete,
            partial,
            not_started,
            overdue,
        }
    }

    /// True once every day is fully published
    pub fn is_campaign_complete(&self) -> bool {
        self.complete == self.total
    }

    /// Calendar dates that still have unpublished days, counting from today
    pub fn dates_remaining(&self) -> usize {
        let mut dates: Vec<NaiveDate> = self
            .days
            .iter()
            .filter(|d| !d.state.is_complete())
            .map(|d| d.date.max(self.today))
            .collect();
        dates.sort_unstable();
        dates.dedup();
        dates.len()
    }

    /// Format as display string
    pub fn display(&self) -> String {
        let mut output = String::from("Publishing Status\n");
        output.push_str(&format!(
            "{}/{} days fully published ({} partial, {} overdue) as of {}\n",
            self.complete, self.total, self.partial, self.overdue, self.today
        ));
        output.push_str(&format!("{:=<60}\n", ""));

        for day in &self.days {
            output.push_str(&format!(
                "{} D{:02} | {} | {:<24} | {}\n",
                day.marker(),
                day.day,
                day.date.format("%a %b %d"),
                day.targets.join(","),
                truncate_text(&day.title, 50)
            ));

            if let PublicationState::Partial { done, pending } = &day.state {
                output.push_str(&format!(
                    "            done: {} | pending: {}\n",
                    done.join(","),
                    pending.join(",")
                ));
            }
        }

        output.push_str("\nLegend: [done] published  [today] due today  [overdue] missed, will catch up  [partial] some targets done\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Cadence;
    use crate::storage::StatusLedger;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn content() -> ContentSet {
        let items = (1..=4)
            .map(|d| {
                ContentItem::new(
                    d,
                    format!("Item {d}"),
                    "body",
                    vec![],
                    vec!["devto".into(), "gitlab".into()],
                )
            })
            .collect();
        ContentSet::new(items).unwrap()
    }

    fn merge(ledger: &StatusLedger, day: u32, targets: &[&str]) {
        let done = targets
            .iter()
            .map(|t| (t.to_string(), format!("https://{t}.example/{day}")))
            .collect();
        ledger.merge(day, &done).unwrap();
    }

    #[test]
    fn test_states_and_timing() {
        let ledger = StatusLedger::in_memory();
        merge(&ledger, 1, &["devto", "gitlab"]);
        merge(&ledger, 2, &["gitlab"]);

        let config = ScheduleConfig::new(date(2026, 2, 11), Cadence::Daily);
        let report = StatusReport::build(
            &content(),
            &ledger.snapshot().unwrap(),
            &config,
            date(2026, 2, 12),
        );

        assert_eq!(report.days[0].state, PublicationState::Complete);
        assert_eq!(
            report.days[1].state,
            PublicationState::Partial {
                done: vec!["gitlab".into()],
                pending: vec!["devto".into()],
            }
        );
        assert_eq!(report.days[2].timing, Timing::Today);
        assert!(report.days[1].is_overdue());
        assert!(!report.days[0].is_overdue());

        assert_eq!(report.complete, 1);
        assert_eq!(report.partial, 1);
        assert_eq!(report.not_started, 2);
        assert_eq!(report.overdue, 1);
        assert!(!report.is_campaign_complete());
        assert_eq!(report.dates_remaining(), 1);
    }

    #[test]
    fn test_display_markers() {
        let ledger = StatusLedger::in_memory();
        merge(&ledger, 1, &["devto"]);

        let config = ScheduleConfig::new(date(2026, 2, 11), Cadence::EveryOtherDay);
        let report = StatusReport::build(
            &content(),
            &ledger.snapshot().unwrap(),
            &config,
            date(2026, 2, 12),
        );

        let text = report.display();
        assert!(text.contains("[overdue] D01"));
        assert!(text.contains("pending: gitlab"));
        assert!(text.contains("[ ]       D03"));
    }

    #[test]
    fn test_campaign_complete() {
        let ledger = StatusLedger::in_memory();
        for day in 1..=4 {
            merge(&ledger, day, &["devto", "gitlab"]);
        }

        let config = ScheduleConfig::new(date(2026, 2, 11), Cadence::Daily);
        let report = StatusReport::build(
            &content(),
            &ledger.snapshot().unwrap(),
            &config,
            date(2026, 3, 1),
        );
        assert!(report.is_campaign_complete());
        assert_eq!(report.dates_remaining(), 0);
    }
}
