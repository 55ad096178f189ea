//! Daily publish trigger
//!
//! Runs a [`ScheduledJob`] once at startup and then once per day at the
//! configured local publish time. A failed run is logged and broadcast; the
//! loop then sleeps until the next tick.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Notify, RwLock};

use super::error::SchedulerResult;
use super::resolver::ScheduleConfig;

// ============================================================================
// Scheduled Job
// ============================================================================

/// Work performed at each tick
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Run once for `today`, returning the number of items dispatched
    async fn run(&self, today: NaiveDate) -> SchedulerResult<usize>;
}

// ============================================================================
// Trigger Events
// ============================================================================

/// Events emitted by the trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// A run began
    RunStarted {
        today: NaiveDate,
        started_at: DateTime<Utc>,
    },

    /// A run finished
    RunCompleted {
        today: NaiveDate,
        dispatched: usize,
        finished_at: DateTime<Utc>,
    },

    /// A run failed; the loop waits for the next tick
    RunFailed { today: NaiveDate, reason: String },

    /// The loop exited
    Stopped,
}

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerState {
    Idle,
    Waiting,
    Running,
}

// ============================================================================
// Publish Trigger
// ============================================================================

/// Daily scheduler loop
pub struct PublishTrigger {
    schedule: ScheduleConfig,
    job: Arc<dyn ScheduledJob>,
    run_on_startup: bool,
    event_sender: broadcast::Sender<TriggerEvent>,
    is_running: Arc<RwLock<bool>>,
    state: Arc<RwLock<TriggerState>>,
    last_run: Arc<RwLock<Option<DateTime<Utc>>>>,
    stop_signal: Arc<Notify>,
}

impl PublishTrigger {
    /// Create a trigger that runs `job` at the schedule's publish time
    pub fn new(schedule: ScheduleConfig, job: Arc<dyn ScheduledJob>) -> Self {
        let (event_sender, _) = broadcast::channel(100);

        Self {
            schedule,
            job,
            run_on_startup: true,
            event_sender,
            is_running: Arc::new(RwLock::new(false)),
            state: Arc::new(RwLock::new(TriggerState::Idle)),
            last_run: Arc::new(RwLock::new(None)),
            stop_signal: Arc::new(Notify::new()),
        }
    }

    /// Whether to run immediately when started
    pub fn with_run_on_startup(mut self, value: bool) -> Self {
        self.run_on_startup = value;
        self
    }

    /// Subscribe to trigger events
    pub fn subscribe(&self) -> broadcast::Receiver<TriggerEvent> {
        self.event_sender.subscribe()
    }

    /// Next publish instant strictly after `now`
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let tz = self.schedule.timezone;
        let local_today = now.with_timezone(&tz).date_naive();

        for offset in 0..=2 {
            let date = local_today + Duration::days(offset);
            let wall = date.and_time(self.schedule.publish_time);
            // A wall time skipped by a DST jump resolves to one hour later
            let local = tz
                .from_local_datetime(&wall)
                .earliest()
                .or_else(|| tz.from_local_datetime(&(wall + Duration::hours(1))).earliest());

            if let Some(local) = local {
                let instant = local.with_timezone(&Utc);
                if instant > now {
                    return instant;
                }
            }
        }

        now + Duration::days(1)
    }

    /// Time left until the next publish instant
    pub fn duration_until_next_run(&self) -> std::time::Duration {
        let now = Utc::now();
        (self.next_run_after(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(60))
    }

    /// Run the loop until [`stop`](Self::stop) is called
    pub async fn start(&self) {
        *self.is_running.write().await = true;
        tracing::info!(
            publish_time = %self.schedule.publish_time.format("%H:%M"),
            timezone = %self.schedule.timezone,
            "Publish trigger started"
        );

        if self.run_on_startup {
            let _ = self.run_once().await;
        }

        while *self.is_running.read().await {
            let sleep_duration = self.duration_until_next_run();
            *self.state.write().await = TriggerState::Waiting;
            tracing::info!(
                next_run = %self.next_run_after(Utc::now()),
                "Sleeping until next publish time"
            );

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    if *self.is_running.read().await {
                        let _ = self.run_once().await;
                    }
                }
                _ = self.stop_signal.notified() => {
                    break;
                }
            }
        }

        *self.is_running.write().await = false;
        *self.state.write().await = TriggerState::Idle;
        let _ = self.event_sender.send(TriggerEvent::Stopped);
        tracing::info!("Publish trigger stopped");
    }

    /// Stop the loop
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.stop_signal.notify_one();
    }

    /// Check if the loop is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Run the job for the current local date and report the outcome
    pub async fn run_once(&self) -> SchedulerResult<usize> {
        let today = self.schedule.today();
        *self.state.write().await = TriggerState::Running;
        let _ = self.event_sender.send(TriggerEvent::RunStarted {
            today,
            started_at: Utc::now(),
        });

        let outcome = self.job.run(today).await;
        *self.last_run.write().await = Some(Utc::now());
        *self.state.write().await = TriggerState::Idle;

        match &outcome {
            Ok(dispatched) => {
                tracing::info!(%today, dispatched, "Scheduled run completed");
                let _ = self.event_sender.send(TriggerEvent::RunCompleted {
                    today,
                    dispatched: *dispatched,
                    finished_at: Utc::now(),
                });
            }
            Err(e) => {
                tracing::error!(%today, error = %e, "Scheduled run failed, waiting for next tick");
                let _ = self.event_sender.send(TriggerEvent::RunFailed {
                    today,
                    reason: e.to_string(),
                });
            }
        }

        outcome
    }

    /// Get trigger status
    pub async fn status(&self) -> TriggerStatus {
        let now = Utc::now();
        let next_run = self.next_run_after(now);

        TriggerStatus {
            is_running: *self.is_running.read().await,
            state: *self.state.read().await,
            publish_time: self.schedule.publish_time.format("%H:%M").to_string(),
            timezone: self.schedule.timezone.to_string(),
            last_run: *self.last_run.read().await,
            next_run,
            seconds_until_next_run: (next_run - now).num_seconds(),
        }
    }
}

/// Trigger status information
#[derive(Debug, Clone, Serialize)]
pub struct TriggerStatus {
    pub is_running: bool,
    pub state: TriggerState,
    pub publish_time: String,
    pub timezone: String,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: DateTime<Utc>,
    pub seconds_until_next_run: i64,
}

impl TriggerStatus {
    /// Format as display string
    pub fn display(&self) -> String {
        let mut output = String::from("Trigger Status\n");
        output.push_str(&format!("{:-<40}\n", ""));
        output.push_str(&format!("Running: {}\n", self.is_running));
        output.push_str(&format!("Publish Time: {} {}\n", self.publish_time, self.timezone));

        let hours = self.seconds_until_next_run / 3600;
        let mins = (self.seconds_until_next_run % 3600) / 60;
        output.push_str(&format!("Next Run: {} (in {hours}h {mins}m)\n", self.next_run));

        match self.last_run {
            Some(at) => output.push_str(&format!("Last Run: {at}\n")),
            None => output.push_str("Last Run: never\n"),
        }

        output
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{Cadence, SchedulerError};
    use chrono::NaiveTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        runs: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ScheduledJob for CountingJob {
        async fn run(&self, _today: NaiveDate) -> SchedulerResult<usize> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SchedulerError::run_failed("ledger unavailable"))
            } else {
                Ok(2)
            }
        }
    }

    fn schedule() -> ScheduleConfig {
        ScheduleConfig::new(NaiveDate::from_ymd_opt(2026, 2, 11).unwrap(), Cadence::Daily)
            .with_publish_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
            .with_timezone(chrono_tz::America::New_York)
    }

    fn trigger(fail: bool) -> (PublishTrigger, Arc<CountingJob>) {
        let job = Arc::new(CountingJob {
            runs: AtomicUsize::new(0),
            fail,
        });
        (PublishTrigger::new(schedule(), job.clone()), job)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let (trigger, _) = trigger(false);
        // 08:00 EST
        let next = trigger.next_run_after(utc(2026, 1, 15, 13, 0));
        assert_eq!(next, utc(2026, 1, 15, 14, 0));
    }

    #[test]
    fn test_next_run_tomorrow_when_past() {
        let (trigger, _) = trigger(false);
        // 10:00 EST
        let next = trigger.next_run_after(utc(2026, 1, 15, 15, 0));
        assert_eq!(next, utc(2026, 1, 16, 14, 0));
    }

    #[test]
    fn test_next_run_follows_dst() {
        let (trigger, _) = trigger(false);
        // Summer: 09:00 EDT is 13:00 UTC
        let next = trigger.next_run_after(utc(2026, 7, 1, 12, 0));
        assert_eq!(next, utc(2026, 7, 1, 13, 0));
    }

    #[tokio::test]
    async fn test_run_once_emits_events() {
        let (trigger, job) = trigger(false);
        let mut receiver = trigger.subscribe();

        assert_eq!(trigger.run_once().await.unwrap(), 2);
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);

        assert!(matches!(receiver.try_recv(), Ok(TriggerEvent::RunStarted { .. })));
        assert!(matches!(
            receiver.try_recv(),
            Ok(TriggerEvent::RunCompleted { dispatched: 2, .. })
        ));
        assert!(trigger.status().await.last_run.is_some());
    }

    #[tokio::test]
    async fn test_failed_run_is_broadcast() {
        let (trigger, _) = trigger(true);
        let mut receiver = trigger.subscribe();

        assert!(trigger.run_once().await.is_err());
        let _ = receiver.try_recv();
        match receiver.try_recv() {
            Ok(TriggerEvent::RunFailed { reason, .. }) => assert!(reason.contains("ledger")),
            other => panic!("Unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_runs_on_startup_and_stops() {
        let (trigger, job) = trigger(false);
        let trigger = Arc::new(trigger);
        let mut receiver = trigger.subscribe();

        let handle = tokio::spawn({
            let trigger = trigger.clone();
            async move { trigger.start().await }
        });

        loop {
            if let TriggerEvent::RunCompleted { .. } = receiver.recv().await.unwrap() {
                break;
            }
        }
        trigger.stop().await;
        handle.await.unwrap();

        assert_eq!(job.runs.load(Ordering::SeqCst), 1);
        assert!(!trigger.is_running().await);
    }

    #[tokio::test]
    async fn test_status_before_start() {
        let (trigger, _) = trigger(false);
        let status = trigger.status().await;

        assert!(!status.is_running);
        assert_eq!(status.state, TriggerState::Idle);
        assert_eq!(status.publish_time, "09:00");
        assert!(status.display().contains("Last Run: never"));
    }
}
