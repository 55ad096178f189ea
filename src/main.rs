use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use crosspost::config::Config;

#[derive(Parser)]
#[command(
    name = "crosspost",
    version,
    about = "Scheduled multi-target publishing for a fixed content campaign",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (environment variables are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish everything due now (catch-up first), or one day
    Publish {
        /// Publish this day regardless of its date
        #[arg(short, long)]
        day: Option<u32>,

        /// Show what would be published without publishing
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Run continuously, publishing once a day at the configured time
    Daemon {
        /// Plan each run without publishing
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Show per-day publishing status
    Status {
        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show the campaign calendar
    Schedule {
        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Print one day's item
    Preview {
        /// Day number
        #[arg(short, long)]
        day: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    // Initialize tracing/logging; CLI flags win over the config file
    let log_format = if cli.log_format == "text" {
        config.logging.format.as_str()
    } else {
        cli.log_format.as_str()
    };
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    tracing::debug!(config = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::Publish { day, dry_run } => {
            tracing::info!(day = ?day, dry_run = %dry_run, "Starting publish command");
            commands::publish(&config, day, dry_run).await?;
        }

        Commands::Daemon { dry_run } => {
            tracing::info!(dry_run = %dry_run, "Starting daemon command");
            commands::daemon(&config, dry_run).await?;
        }

        Commands::Status { json } => {
            commands::status(&config, json).await?;
        }

        Commands::Schedule { json } => {
            commands::schedule(&config, json).await?;
        }

        Commands::Preview { day } => {
            commands::preview(&config, day).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            tracing_subscriber::EnvFilter::new("crosspost=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new(format!("crosspost={level},warn"))
        }
    });

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
