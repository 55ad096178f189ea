//! Campaign runner
//!
//! Ties the content set, schedule, ledger and dispatcher together. A run
//! selects the due set and dispatches it one item at a time; a ledger failure
//! stops the run so the engine never moves past a day whose merge failed.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::{DispatchPlan, DispatchResult, Dispatcher};
use crate::error::{CrosspostErrorTrait, Error, Result};
use crate::models::{ContentItem, ContentSet};
use crate::report::StatusReport;
use crate::scheduler::{
    select_due, CampaignSchedule, DueSet, ScheduleConfig, ScheduledJob, SchedulerError,
    SchedulerResult,
};
use crate::storage::StatusLedger;
use crate::targets::TargetRegistry;

/// Outcome of one publish run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub today: NaiveDate,
    pub results: Vec<DispatchResult>,
}

impl RunSummary {
    /// Items handed to the dispatcher
    pub fn dispatched(&self) -> usize {
        self.results.len()
    }

    /// Targets published in this run
    pub fn published(&self) -> usize {
        self.results.iter().map(|r| r.succeeded.len()).sum()
    }

    /// Targets that failed in this run
    pub fn failed(&self) -> usize {
        self.results.iter().map(|r| r.failed.len()).sum()
    }
}

/// Campaign progress after a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Every item became fully published in this run; the flag was written
    JustCompleted { total: usize },
    /// The flag already existed
    AlreadyCompleted { total: usize },
    /// Every item is published and no flag file is configured
    Complete { total: usize },
    /// Items remain
    InProgress {
        complete: usize,
        total: usize,
        dates_remaining: usize,
    },
}

/// A loaded campaign ready to run
#[derive(Debug)]
pub struct Campaign {
    content: ContentSet,
    schedule: ScheduleConfig,
    dispatcher: Dispatcher,
    completion_flag: Option<PathBuf>,
}

impl Campaign {
    /// Create a campaign
    pub fn new(content: ContentSet, schedule: ScheduleConfig, dispatcher: Dispatcher) -> Self {
        Self {
            content,
            schedule,
            dispatcher,
            completion_flag: None,
        }
    }

    /// Write a flag file once the campaign is fully published
    pub fn with_completion_flag(mut self, path: impl Into<PathBuf>) -> Self {
        self.completion_flag = Some(path.into());
        self
    }

    /// Load content, open the ledger and build the registry from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let schedule = config.schedule_config()?;
        let content = ContentSet::load(&config.storage.content_path)?;
        let ledger = Arc::new(StatusLedger::open(&config.storage.ledger_path)?);
        let registry = Arc::new(TargetRegistry::from_config(&config.targets)?);

        let unregistered: Vec<&str> = content
            .all_targets()
            .into_iter()
            .filter(|t| !registry.contains(t))
            .collect();
        if !unregistered.is_empty() {
            tracing::warn!(
                targets = ?unregistered,
                "Content names targets with no configured publisher; they will fail until configured"
            );
        }

        tracing::info!(
            items = content.len(),
            start_date = %schedule.start_date,
            cadence = %schedule.cadence,
            ledger = %ledger.location(),
            "Campaign loaded"
        );

        let dispatcher =
            Dispatcher::new(registry, ledger).with_attempt_timeout(config.attempt_timeout());

        Ok(Self::new(content, schedule, dispatcher)
            .with_completion_flag(config.storage.completion_flag_path.clone()))
    }

    pub fn content(&self) -> &ContentSet {
        &self.content
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    pub fn ledger(&self) -> &StatusLedger {
        self.dispatcher.ledger()
    }

    /// Today in the campaign timezone
    pub fn today(&self) -> NaiveDate {
        self.schedule.today()
    }

    /// Look up an item by day number
    pub fn item(&self, day: u32) -> Result<&ContentItem> {
        self.content
            .get(day)
            .ok_or_else(|| SchedulerError::day_not_found(day, self.content.last_day()).into())
    }

    /// Items due on `today`
    pub fn due(&self, today: NaiveDate) -> Result<DueSet<'_>> {
        let snapshot = self.ledger().snapshot()?;
        Ok(select_due(&self.content, &snapshot, &self.schedule, today))
    }

    /// Dispatch every due item, in order
    pub async fn run_due(&self, today: NaiveDate) -> Result<RunSummary> {
        let due = self.due(today)?;
        let mut summary = RunSummary {
            today,
            results: Vec::with_capacity(due.len()),
        };

        if due.is_empty() {
            tracing::info!(%today, "No items due");
        } else {
            tracing::info!(
                %today,
                catch_up = due.catch_up.len(),
                due_today = due.today.len(),
                "Publishing due items"
            );
        }

        for item in due.ordered() {
            let result = self.dispatcher.dispatch(item).await?;
            summary.results.push(result);
        }

        self.report_completion(today);
        Ok(summary)
    }

    /// Dispatch a single day regardless of its date
    pub async fn run_day(&self, day: u32) -> Result<DispatchResult> {
        let item = self.item(day)?;
        let result = self.dispatcher.dispatch(item).await?;
        self.report_completion(self.today());
        Ok(result)
    }

    /// What a run on `today` would do
    pub fn plan_due(&self, today: NaiveDate) -> Result<Vec<DispatchPlan>> {
        self.due(today)?
            .ordered()
            .map(|item| self.dispatcher.plan(item).map_err(Error::from))
            .collect()
    }

    /// What dispatching `day` would do
    pub fn plan_day(&self, day: u32) -> Result<DispatchPlan> {
        Ok(self.dispatcher.plan(self.item(day)?)?)
    }

    /// Per-day status as of `today`
    pub fn status(&self, today: NaiveDate) -> Result<StatusReport> {
        let snapshot = self.ledger().snapshot()?;
        Ok(StatusReport::build(
            &self.content,
            &snapshot,
            &self.schedule,
            today,
        ))
    }

    /// Full campaign calendar
    pub fn calendar(&self) -> CampaignSchedule {
        CampaignSchedule::build(&self.content, &self.schedule)
    }

    /// Log progress and write the completion flag once everything is published
    pub fn check_completion(&self, today: NaiveDate) -> Result<CompletionStatus> {
        let report = self.status(today)?;

        if !report.is_campaign_complete() {
            let status = CompletionStatus::InProgress {
                complete: report.complete,
                total: report.total,
                dates_remaining: report.dates_remaining(),
            };
            tracing::info!(
                complete = report.complete,
                total = report.total,
                dates_remaining = report.dates_remaining(),
                "Campaign progress"
            );
            return Ok(status);
        }

        let Some(flag) = &self.completion_flag else {
            return Ok(CompletionStatus::Complete {
                total: report.total,
            });
        };

        if flag.exists() {
            return Ok(CompletionStatus::AlreadyCompleted {
                total: report.total,
            });
        }

        write_completion_flag(flag, report.total)?;
        tracing::info!(
            total = report.total,
            flag = %flag.display(),
            "Campaign complete, every item published"
        );
        Ok(CompletionStatus::JustCompleted {
            total: report.total,
        })
    }

    /// Completion check after a run; errors are logged, not returned
    fn report_completion(&self, today: NaiveDate) {
        if let Err(e) = self.check_completion(today) {
            tracing::warn!(error = %e, "Completion check failed");
        }
    }
}

fn write_completion_flag(path: &Path, total: usize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let content = format!(
        "Campaign completed on {}\nTotal items: {total}\nPublished: {total}\n",
        Utc::now().to_rfc3339()
    );
    std::fs::write(path, content)?;
    Ok(())
}

/// Scheduler job running a campaign, or only planning it in dry-run mode
pub struct CampaignJob {
    campaign: Arc<Campaign>,
    dry_run: bool,
}

impl CampaignJob {
    pub fn new(campaign: Arc<Campaign>, dry_run: bool) -> Self {
        Self { campaign, dry_run }
    }
}

#[async_trait]
impl ScheduledJob for CampaignJob {
    async fn run(&self, today: NaiveDate) -> SchedulerResult<usize> {
        if self.dry_run {
            let plans = self
                .campaign
                .plan_due(today)
                .map_err(|e| SchedulerError::run_failed(e.to_string()))?;
            for plan in &plans {
                tracing::info!(
                    day = plan.day,
                    would_publish = ?plan.remaining,
                    already_done = ?plan.already_done,
                    "Dry run"
                );
            }
            return Ok(plans.len());
        }

        match self.campaign.run_due(today).await {
            Ok(summary) => Ok(summary.dispatched()),
            Err(e) => {
                tracing::error!(
                    %today,
                    category = %e.category(),
                    recoverable = e.is_recoverable(),
                    error = %e,
                    "Campaign run stopped"
                );
                Err(SchedulerError::run_failed(e.to_string()))
            }
        }
    }
}
