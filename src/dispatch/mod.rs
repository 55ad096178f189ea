//! Per-item dispatcher
//!
//! Publishing one item is a fan-out of independent per-target attempts. The
//! unit of completion is the (day, target) pair, not the item:
//!
//! 1. read the day's record from the ledger
//! 2. attempt every target not yet done, each in its own task
//! 3. merge all successes into the ledger in a single call
//!
//! A failing, hanging or panicking target never affects its siblings. Failed
//! targets are not retried here; they stay pending in the ledger and the
//! next run picks them up.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::CrosspostErrorTrait;
use crate::models::ContentItem;
use crate::storage::{LedgerResult, StatusLedger};
use crate::targets::{TargetError, TargetRegistry, TargetResult};

/// Default upper bound for a single target attempt
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of dispatching one item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    /// Campaign day of the item
    pub day: u32,

    /// Targets attempted in this call
    pub attempted: Vec<String>,

    /// Successful targets and their locations
    pub succeeded: BTreeMap<String, String>,

    /// Failed targets and the reason
    pub failed: BTreeMap<String, String>,
}

impl DispatchResult {
    fn new(day: u32) -> Self {
        Self {
            day,
            ..Default::default()
        }
    }

    /// True if nothing needed publishing
    pub fn is_noop(&self) -> bool {
        self.attempted.is_empty()
    }

    /// True if at least one attempted target failed
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// One-line summary for logs and CLI output
    pub fn summary(&self) -> String {
        if self.is_noop() {
            return format!("Day {}: nothing new, all targets already published", self.day);
        }
        format!(
            "Day {}: {}/{} targets published this run",
            self.day,
            self.succeeded.len(),
            self.attempted.len()
        )
    }
}

/// What a dispatch would do, without doing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    pub day: u32,
    pub title: String,
    pub remaining: Vec<String>,
    pub already_done: Vec<String>,
    pub unregistered: Vec<String>,
}

impl DispatchPlan {
    /// Format as display string
    pub fn display(&self, item: &ContentItem) -> String {
        let mut output = format!("Day {} | {}\n", self.day, self.title);
        output.push_str(&format!("  Tags:      {}\n", item.tags.join(", ")));
        output.push_str(&format!(
            "  Body:      {} chars, ~{} words\n",
            item.body.chars().count(),
            item.word_count()
        ));
        if self.remaining.is_empty() {
            output.push_str("  Would publish to: nothing (already complete)\n");
        } else {
            output.push_str(&format!(
                "  Would publish to: {}\n",
                self.remaining.join(", ")
            ));
        }
        if !self.already_done.is_empty() {
            output.push_str(&format!("  Already done:     {}\n", self.already_done.join(", ")));
        }
        if !self.unregistered.is_empty() {
            output.push_str(&format!(
                "  Not configured:   {}\n",
                self.unregistered.join(", ")
            ));
        }
        output
    }
}

/// Dispatches items to their remaining targets
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<TargetRegistry>,
    ledger: Arc<StatusLedger>,
    attempt_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(registry: Arc<TargetRegistry>, ledger: Arc<StatusLedger>) -> Self {
        Self {
            registry,
            ledger,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Set the per-target attempt timeout
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// The ledger this dispatcher merges into
    pub fn ledger(&self) -> &Arc<StatusLedger> {
        &self.ledger
    }

    /// The registry this dispatcher publishes through
    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    /// Publish `item` to every target it is not yet published to
    ///
    /// Target failures are reported in the result. Only ledger errors are
    /// returned as `Err`; in that case the successes of this call were not
    /// committed and will be attempted again by the next run.
    pub async fn dispatch(&self, item: &ContentItem) -> LedgerResult<DispatchResult> {
        let record = self.ledger.get(item.day)?;
        let remaining: Vec<String> = record
            .pending_for(item)
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut result = DispatchResult::new(item.day);

        if remaining.is_empty() {
            tracing::info!(day = item.day, "Already published to all targets, skipping");
            return Ok(result);
        }

        tracing::info!(
            day = item.day,
            title = %item.title,
            remaining = ?remaining,
            done = record.targets_done.len(),
            "Dispatching item"
        );

        let shared = Arc::new(item.clone());
        let (targets, handles): (Vec<String>, Vec<JoinHandle<TargetResult<String>>>) =
            remaining
                .into_iter()
                .map(|target| {
                    let handle = self.spawn_attempt(&target, Arc::clone(&shared));
                    (target, handle)
                })
                .unzip();
        let joined = futures::future::join_all(handles).await;

        for (target, joined) in targets.into_iter().zip(joined) {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(join_error) => Err(TargetError::Other(format!(
                    "publisher task failed: {join_error}"
                ))),
            };

            match outcome {
                Ok(location) => {
                    tracing::info!(day = item.day, target_id = %target, location = %location, "Target published");
                    result.succeeded.insert(target.clone(), location);
                }
                Err(e) => {
                    tracing::warn!(
                        day = item.day,
                        target_id = %target,
                        category = %e.category(),
                        recoverable = e.is_recoverable(),
                        reason = %e,
                        "Target failed"
                    );
                    result.failed.insert(target.clone(), e.to_string());
                }
            }
            result.attempted.push(target);
        }

        if let Err(e) = self.ledger.merge(item.day, &result.succeeded) {
            tracing::error!(
                day = item.day,
                error = %e,
                uncommitted = ?result.succeeded.keys().collect::<Vec<_>>(),
                "Ledger merge failed, successes not recorded"
            );
            return Err(e);
        }

        tracing::info!(
            day = item.day,
            published = result.succeeded.len(),
            failed = result.failed.len(),
            "{}",
            result.summary()
        );

        Ok(result)
    }

    /// Describe what `dispatch` would attempt, without publishing
    pub fn plan(&self, item: &ContentItem) -> LedgerResult<DispatchPlan> {
        let record = self.ledger.get(item.day)?;
        let remaining: Vec<String> = record
            .pending_for(item)
            .into_iter()
            .map(str::to_string)
            .collect();
        let unregistered = remaining
            .iter()
            .filter(|t| !self.registry.contains(t))
            .cloned()
            .collect();

        Ok(DispatchPlan {
            day: item.day,
            title: item.title.clone(),
            already_done: record.done_for(item).into_iter().map(str::to_string).collect(),
            remaining,
            unregistered,
        })
    }

    fn spawn_attempt(
        &self,
        target_id: &str,
        item: Arc<ContentItem>,
    ) -> JoinHandle<TargetResult<String>> {
        let target = self.registry.get(target_id);
        let timeout = self.attempt_timeout;
        let target_id = target_id.to_string();

        tokio::spawn(async move {
            let Some(target) = target else {
                return Err(TargetError::NotConfigured(format!(
                    "no publisher registered for target '{target_id}'"
                )));
            };

            tokio::time::timeout(timeout, target.publish(&item))
                .await
                .unwrap_or(Err(TargetError::Timeout(timeout)))
        })
    }
}
