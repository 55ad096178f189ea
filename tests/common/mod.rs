//! Common test utilities

use async_trait::async_trait;
use chrono::NaiveDate;
use crosspost::models::{ContentItem, ContentSet};
use crosspost::targets::{PublishTarget, TargetError, TargetResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Build a date, panicking on invalid input
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Content set of `days` items, each published to `targets`
pub fn content_set(days: u32, targets: &[&str]) -> ContentSet {
    let items = (1..=days)
        .map(|day| {
            ContentItem::new(
                day,
                format!("Article {day}"),
                format!("Body of article {day}"),
                vec!["rust".to_string(), "Web Dev".to_string()],
                targets.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect();
    ContentSet::new(items).unwrap()
}

/// How a [`FakeTarget`] behaves
#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
    Panic,
}

/// In-process target counting its publish calls
pub struct FakeTarget {
    id: &'static str,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakeTarget {
    pub fn new(id: &'static str, behavior: Behavior) -> Self {
        Self {
            id,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter, readable after the target moved into a registry
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl PublishTarget for FakeTarget {
    fn id(&self) -> &str {
        self.id
    }

    async fn publish(&self, item: &ContentItem) -> TargetResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(format!("https://{}.example/day-{}", self.id, item.day)),
            Behavior::Fail => Err(TargetError::Rejected {
                status: 500,
                body: "upstream error".to_string(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("unreachable".to_string())
            }
            Behavior::Panic => panic!("publisher bug"),
        }
    }
}

/// Read a call counter
#[allow(dead_code)]
pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
