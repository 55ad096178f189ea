use anyhow::{Context, Result};

use crosspost::config::Config;
use crosspost::dispatch::DispatchResult;
use crosspost::runner::Campaign;

pub async fn publish(config: &Config, day: Option<u32>, dry_run: bool) -> Result<()> {
    let campaign = Campaign::from_config(config).context("Failed to load campaign")?;

    if dry_run {
        return print_plan(&campaign, day);
    }

    match day {
        Some(day) => {
            let result = campaign
                .run_day(day)
                .await
                .with_context(|| format!("Failed to publish day {day}"))?;
            print_result(&result);
        }
        None => {
            let today = campaign.today();
            let summary = campaign
                .run_due(today)
                .await
                .context("Publish run stopped")?;

            if summary.results.is_empty() {
                println!("No items scheduled for {today}.");
                println!("Use --day N to publish a specific day, or check `crosspost schedule`.");
                return Ok(());
            }

            println!("Publishing {} item(s) for {today}", summary.dispatched());
            println!("========================");
            for result in &summary.results {
                print_result(result);
            }
            println!(
                "\nPublished {} target(s), {} failed",
                summary.published(),
                summary.failed()
            );
        }
    }

    Ok(())
}

fn print_plan(campaign: &Campaign, day: Option<u32>) -> Result<()> {
    let plans = match day {
        Some(day) => vec![campaign.plan_day(day)?],
        None => campaign.plan_due(campaign.today())?,
    };

    println!("DRY RUN: nothing will be published");
    println!("==================================");
    if plans.is_empty() {
        println!("No items due.");
    }
    for plan in &plans {
        let item = campaign.item(plan.day)?;
        print!("{}", plan.display(item));
    }
    Ok(())
}

fn print_result(result: &DispatchResult) {
    println!("\n{}", result.summary());
    for (target, location) in &result.succeeded {
        println!("  ok     {target:<12} {location}");
    }
    for (target, reason) in &result.failed {
        println!("  failed {target:<12} {reason}");
    }
    if result.has_failures() {
        println!("  Failed targets stay pending and are retried on the next run.");
    }
}
