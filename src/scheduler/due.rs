//! Due-set selection
//!
//! Given the content set, a ledger snapshot and "today", decide which items a
//! run should dispatch. Items whose date has passed without being fully
//! published are caught up first; they never expire.

use chrono::NaiveDate;
use serde::Serialize;

use super::resolver::ScheduleConfig;
use crate::models::{ContentItem, ContentSet};
use crate::storage::LedgerDocument;

/// Items a run should dispatch, in dispatch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DueSet<'a> {
    /// Past-due items not yet fully published, ascending by day
    pub catch_up: Vec<&'a ContentItem>,

    /// Items due today, in content set order
    pub today: Vec<&'a ContentItem>,
}

impl<'a> DueSet<'a> {
    /// Catch-up items followed by today's items
    pub fn ordered(&self) -> impl Iterator<Item = &'a ContentItem> + '_ {
        self.catch_up.iter().chain(self.today.iter()).copied()
    }

    /// Day numbers in dispatch order
    pub fn days(&self) -> Vec<u32> {
        self.ordered().map(|item| item.day).collect()
    }

    /// Total number of items
    pub fn len(&self) -> usize {
        self.catch_up.len() + self.today.len()
    }

    /// True if nothing is due
    pub fn is_empty(&self) -> bool {
        self.catch_up.is_empty() && self.today.is_empty()
    }
}

/// Select the items due on `today`
///
/// Today's items are included whatever their ledger state; the dispatcher
/// skips the targets already done. Nothing is due before the start date.
pub fn select_due<'a>(
    content: &'a ContentSet,
    ledger: &LedgerDocument,
    config: &ScheduleConfig,
    today: NaiveDate,
) -> DueSet<'a> {
    let mut due = DueSet::default();

    if today < config.start_date {
        return due;
    }

    for item in content.items() {
        let date = config.resolve(item.day);
        if date < today {
            if !ledger.is_complete(item) {
                due.catch_up.push(item);
            }
        } else if date == today {
            due.today.push(item);
        }
    }

    due.catch_up.sort_by_key(|item| item.day);

    if !due.catch_up.is_empty() {
        tracing::info!(
            days = ?due.catch_up.iter().map(|i| i.day).collect::<Vec<_>>(),
            "Catching up on missed days"
        );
    }

    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Cadence;
    use crate::storage::StatusLedger;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn content(days: u32) -> ContentSet {
        let items = (1..=days)
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

    fn config() -> ScheduleConfig {
        ScheduleConfig::new(date(2026, 2, 11), Cadence::EveryOtherDay)
    }

    fn done(targets: &[&str]) -> BTreeMap<String, String> {
        targets
            .iter()
            .map(|t| (t.to_string(), format!("https://{t}.example")))
            .collect()
    }

    #[test]
    fn test_nothing_due_before_start() {
        let content = content(4);
        let due = select_due(&content, &LedgerDocument::default(), &config(), date(2026, 2, 10));
        assert!(due.is_empty());
    }

    #[test]
    fn test_today_items_on_start_date() {
        let content = content(4);
        let due = select_due(&content, &LedgerDocument::default(), &config(), date(2026, 2, 11));
        assert!(due.catch_up.is_empty());
        assert_eq!(due.days(), vec![1, 2]);
    }

    #[test]
    fn test_off_day_catches_up_everything_missed() {
        let content = content(6);
        let due = select_due(&content, &LedgerDocument::default(), &config(), date(2026, 2, 14));
        assert_eq!(due.days(), vec![1, 2, 3, 4]);
        assert!(due.today.is_empty());
    }

    #[test]
    fn test_catch_up_skips_completed_and_keeps_partial() {
        let content = content(6);
        let ledger = StatusLedger::in_memory();
        ledger.merge(1, &done(&["devto", "gitlab"])).unwrap();
        ledger.merge(2, &done(&["devto"])).unwrap();

        let snapshot = ledger.snapshot().unwrap();
        let due = select_due(&content, &snapshot, &config(), date(2026, 2, 15));
        assert_eq!(due.days(), vec![2, 3, 4, 5, 6]);
        assert_eq!(due.today.len(), 2);
    }

    #[test]
    fn test_today_included_even_when_complete() {
        let content = content(2);
        let ledger = StatusLedger::in_memory();
        ledger.merge(1, &done(&["devto", "gitlab"])).unwrap();

        let snapshot = ledger.snapshot().unwrap();
        let due = select_due(&content, &snapshot, &config(), date(2026, 2, 11));
        assert_eq!(due.days(), vec![1, 2]);
    }

    #[test]
    fn test_missed_day_still_due_three_days_later() {
        let content = content(6);
        let cfg = config();
        let today = cfg.resolve(3) + Duration::days(3);

        let due = select_due(&content, &LedgerDocument::default(), &cfg, today);
        assert!(due.catch_up.iter().any(|item| item.day == 3));
    }

    #[test]
    fn test_catch_up_sorted_when_content_is_out_of_order() {
        let items = [4, 3, 2, 1]
            .into_iter()
            .map(|d| ContentItem::new(d, format!("Item {d}"), "body", vec![], vec!["devto".into()]))
            .collect();
        let content = ContentSet::new(items).unwrap();

        let due = select_due(&content, &LedgerDocument::default(), &config(), date(2026, 2, 13));
        let catch_up: Vec<u32> = due.catch_up.iter().map(|i| i.day).collect();
        let today: Vec<u32> = due.today.iter().map(|i| i.day).collect();

        assert_eq!(catch_up, vec![1, 2]);
        assert_eq!(today, vec![4, 3]);
        assert_eq!(due.days(), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_campaign_over_only_incomplete_remain() {
        let content = content(2);
        let ledger = StatusLedger::in_memory();
        ledger.merge(2, &done(&["devto", "gitlab"])).unwrap();

        let snapshot = ledger.snapshot().unwrap();
        let due = select_due(&content, &snapshot, &config(), date(2026, 6, 1));
        assert_eq!(due.days(), vec![1]);
    }
}
