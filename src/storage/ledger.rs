//! Status ledger
//!
//! Durable record of which targets each campaign day has been published to.
//! The ledger is the only writer of publication state and exposes a single
//! mutation, [`StatusLedger::merge`]. Every read goes back to the backing
//! store, so state from an earlier process (or a manual reset) is always
//! what the caller sees.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;

use super::store::{JsonFileStore, LedgerStore, MemoryStore};
use super::{LedgerError, LedgerResult};
use crate::models::ContentItem;

// ============================================================================
// Records
// ============================================================================

/// Publication state of a single campaign day
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Targets the day has been published to
    #[serde(default, alias = "platforms")]
    pub targets_done: BTreeSet<String>,

    /// When the first target succeeded
    #[serde(
        default,
        alias = "published_at",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_published_at: Option<DateTime<Utc>>,

    /// Where each target published it (first write wins)
    #[serde(default, alias = "urls")]
    pub locations: BTreeMap<String, String>,
}

/// RFC 3339, or an offset-less ISO timestamp read as UTC; anything else is dropped
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|raw| {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
            })
            .ok()
    }))
}

impl PublicationRecord {
    /// True if no target has completed
    pub fn is_empty(&self) -> bool {
        self.targets_done.is_empty()
    }

    /// Check whether a target is done
    pub fn is_done(&self, target: &str) -> bool {
        self.targets_done.contains(target)
    }

    /// Check whether every configured target of `item` is done
    pub fn is_complete_for(&self, item: &ContentItem) -> bool {
        item.targets.iter().all(|t| self.targets_done.contains(t))
    }

    /// Configured targets of `item` that are not done, in item order
    pub fn pending_for<'a>(&self, item: &'a ContentItem) -> Vec<&'a str> {
        item.targets
            .iter()
            .filter(|t| !self.targets_done.contains(*t))
            .map(String::as_str)
            .collect()
    }

    /// Configured targets of `item` that are done, in item order
    pub fn done_for<'a>(&self, item: &'a ContentItem) -> Vec<&'a str> {
        item.targets
            .iter()
            .filter(|t| self.targets_done.contains(*t))
            .map(String::as_str)
            .collect()
    }

    /// Fold newly completed targets into the record. Returns true if anything changed.
    fn absorb(&mut self, newly_done: &BTreeMap<String, String>, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        for (target, location) in newly_done {
            if self.targets_done.insert(target.clone()) {
                changed = true;
            }
            if !self.locations.contains_key(target) {
                self.locations.insert(target.clone(), location.clone());
                changed = true;
            }
        }

        if changed && self.first_published_at.is_none() {
            self.first_published_at = Some(now);
        }

        changed
    }
}

/// Whole ledger content, keyed by day number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default)]
    pub published: BTreeMap<u32, PublicationRecord>,
}

impl LedgerDocument {
    /// Record for `day`, or an empty record for an unknown day
    pub fn record(&self, day: u32) -> PublicationRecord {
        self.published.get(&day).cloned().unwrap_or_default()
    }

    /// Check whether `item` is fully published
    pub fn is_complete(&self, item: &ContentItem) -> bool {
        self.published
            .get(&item.day)
            .is_some_and(|r| r.is_complete_for(item))
    }
}

// ============================================================================
// Status Ledger
// ============================================================================

/// Durable day → publication record mapping with an atomic merge
pub struct StatusLedger {
    store: Box<dyn LedgerStore>,
    write_lock: Mutex<()>,
}

impl StatusLedger {
    /// Create a ledger over any backing store
    pub fn new(store: impl LedgerStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            write_lock: Mutex::new(()),
        }
    }

    /// Open a JSON-file backed ledger
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let store = JsonFileStore::new(path)?;
        // Surface a corrupt file at startup rather than on the first dispatch
        store.load()?;
        tracing::info!(path = %path.display(), "Status ledger opened");
        Ok(Self::new(store))
    }

    /// Create an empty in-memory ledger
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Where the ledger lives
    pub fn location(&self) -> String {
        self.store.describe()
    }

    /// Record for `day`; an unknown day yields an empty record
    pub fn get(&self, day: u32) -> LedgerResult<PublicationRecord> {
        Ok(self.store.load()?.record(day))
    }

    /// Full ledger content
    pub fn snapshot(&self) -> LedgerResult<LedgerDocument> {
        self.store.load()
    }

    /// Merge newly completed targets into `day`'s record
    ///
    /// Target keys are unioned into `targets_done`, locations are first-write-wins
    /// and `first_published_at` is set on the first non-empty merge. The updated
    /// document is durably persisted before this returns `Ok`; on error nothing
    /// is committed. Merges are serialized within the process by a mutex and
    /// across processes by the store's [`update`](LedgerStore::update).
    pub fn merge(
        &self,
        day: u32,
        newly_done: &BTreeMap<String, String>,
    ) -> LedgerResult<PublicationRecord> {
        let _guard = self.write_lock.lock().map_err(|_| LedgerError::LockPoisoned)?;

        if newly_done.is_empty() {
            return Ok(self.store.load()?.record(day));
        }

        let now = Utc::now();
        let mut changed = false;
        let document = self.store.update(&mut |document| {
            changed = document
                .published
                .entry(day)
                .or_default()
                .absorb(newly_done, now);
            changed
        })?;

        if changed {
            tracing::debug!(
                day,
                targets = ?newly_done.keys().collect::<Vec<_>>(),
                "Ledger merge committed"
            );
        }

        Ok(document.record(day))
    }
}

impl std::fmt::Debug for StatusLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusLedger")
            .field("store", &self.store.describe())
            .finish()
    }
}
