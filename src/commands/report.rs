use anyhow::{Context, Result};

use crosspost::config::Config;
use crosspost::models::ContentSet;
use crosspost::report::StatusReport;
use crosspost::scheduler::{CampaignSchedule, SchedulerError};
use crosspost::storage::StatusLedger;

pub async fn status(config: &Config, json: bool) -> Result<()> {
    let schedule = config.schedule_config()?;
    let content = load_content(config)?;
    let ledger = StatusLedger::open(&config.storage.ledger_path)
        .context("Failed to open status ledger")?;

    let report = StatusReport::build(&content, &ledger.snapshot()?, &schedule, schedule.today());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.display());
    }
    Ok(())
}

pub async fn schedule(config: &Config, json: bool) -> Result<()> {
    let schedule = config.schedule_config()?;
    let content = load_content(config)?;
    let calendar = CampaignSchedule::build(&content, &schedule);

    if json {
        println!("{}", serde_json::to_string_pretty(&calendar)?);
    } else {
        print!("{}", calendar.display());
    }
    Ok(())
}

pub async fn preview(config: &Config, day: u32) -> Result<()> {
    let content = load_content(config)?;
    let item = content
        .get(day)
        .ok_or_else(|| SchedulerError::day_not_found(day, content.last_day()))?;

    println!("{:=<60}", "");
    println!("  DAY {} | {}", item.day, item.targets.join(", "));
    println!("  {}", item.title);
    println!("  Tags: {}", item.tags.join(", "));
    println!("{:=<60}\n", "");
    println!("{}", item.body);
    println!("\n{:=<60}", "");
    println!("  Word count: ~{}", item.word_count());
    println!("{:=<60}", "");
    Ok(())
}

fn load_content(config: &Config) -> Result<ContentSet> {
    ContentSet::load(&config.storage.content_path).with_context(|| {
        format!(
            "Failed to load content set from {}",
            config.storage.content_path.display()
        )
    })
}
