use anyhow::{Context, Result};
use std::sync::Arc;

use crosspost::config::Config;
use crosspost::runner::{Campaign, CampaignJob};
use crosspost::scheduler::{PublishTrigger, TriggerEvent};

pub async fn daemon(config: &Config, dry_run: bool) -> Result<()> {
    let campaign = Arc::new(Campaign::from_config(config).context("Failed to load campaign")?);
    let schedule = campaign.schedule().clone();

    let job = Arc::new(CampaignJob::new(campaign, dry_run));
    let trigger = Arc::new(PublishTrigger::new(schedule.clone(), job));

    println!("Daemon started.\n");
    print!("{}", trigger.status().await.display());
    println!("  Start date: {}", schedule.start_date);
    println!("  Cadence: {}", schedule.cadence);
    if dry_run {
        println!("  Dry run: publishers will not be called");
    }
    println!("  Press Ctrl+C to stop.\n");

    let mut events = trigger.subscribe();
    let event_logger = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                TriggerEvent::RunCompleted { today, dispatched, .. } => {
                    println!("[{today}] run completed, {dispatched} item(s) dispatched");
                }
                TriggerEvent::RunFailed { today, reason } => {
                    eprintln!("[{today}] run failed: {reason}");
                }
                TriggerEvent::Stopped => break,
                TriggerEvent::RunStarted { .. } => {}
            }
        }
    });

    let runner = tokio::spawn({
        let trigger = trigger.clone();
        async move { trigger.start().await }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    tracing::info!("Shutdown requested");

    trigger.stop().await;
    runner.await.context("Scheduler task failed")?;
    let _ = event_logger.await;

    println!("Daemon stopped.");
    Ok(())
}
