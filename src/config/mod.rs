//! Configuration management for crosspost
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scheduler::{Cadence, ScheduleConfig, SchedulerError};
use crate::targets::{DevtoConfig, GitlabConfig, HashnodeConfig, WebhookConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Campaign schedule
    #[serde(default)]
    pub campaign: CampaignConfig,

    /// File locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Dispatcher settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Publishing targets
    #[serde(default)]
    pub targets: TargetsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Campaign schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Calendar date of day 1 (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,

    /// Batch cadence
    #[serde(default)]
    pub cadence: Cadence,

    /// Number of items sharing one calendar date
    #[serde(default = "default_daily_item_count")]
    pub daily_item_count: u32,

    /// Local publish time (HH:MM)
    #[serde(default = "default_publish_time")]
    pub publish_time: String,

    /// IANA timezone name
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON content set
    #[serde(default = "default_content_path")]
    pub content_path: PathBuf,

    /// JSON status ledger
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Flag file written once the campaign is fully published
    #[serde(default = "default_completion_flag_path")]
    pub completion_flag_path: PathBuf,
}

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Upper bound for a single target attempt, in seconds
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

/// Publishing target configuration
///
/// A target without a section is not registered; items naming it fail for
/// that target until it is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsConfig {
    #[serde(default)]
    pub devto: Option<DevtoConfig>,

    #[serde(default)]
    pub hashnode: Option<HashnodeConfig>,

    #[serde(default)]
    pub gitlab: Option<GitlabConfig>,

    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_daily_item_count() -> u32 {
    2
}

fn default_publish_time() -> String {
    String::from("09:00")
}

fn default_timezone() -> String {
    String::from("America/New_York")
}

fn default_content_path() -> PathBuf {
    PathBuf::from("articles/articles.json")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("logs/publish_status.json")
}

fn default_completion_flag_path() -> PathBuf {
    PathBuf::from("logs/campaign_complete.flag")
}

fn default_attempt_timeout_secs() -> u64 {
    120
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("text")
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            cadence: Cadence::default(),
            daily_item_count: default_daily_item_count(),
            publish_time: default_publish_time(),
            timezone: default_timezone(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            content_path: default_content_path(),
            ledger_path: default_ledger_path(),
            completion_flag_path: default_completion_flag_path(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let start_date = env_var("CROSSPOST_START_DATE")
            .map(|v| {
                NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                    .with_context(|| format!("CROSSPOST_START_DATE '{v}' is not YYYY-MM-DD"))
            })
            .transpose()?;

        let cadence = env_var("CROSSPOST_CADENCE")
            .map(|v| v.parse::<Cadence>())
            .transpose()?
            .unwrap_or_default();

        let daily_item_count = env_var("CROSSPOST_DAILY_ITEM_COUNT")
            .map(|v| {
                v.parse::<u32>()
                    .with_context(|| format!("CROSSPOST_DAILY_ITEM_COUNT '{v}' is not a number"))
            })
            .transpose()?
            .unwrap_or_else(default_daily_item_count);

        let publish_time =
            env_var("CROSSPOST_PUBLISH_TIME").unwrap_or_else(default_publish_time);
        let timezone = env_var("CROSSPOST_TIMEZONE").unwrap_or_else(default_timezone);

        let storage = StorageConfig {
            content_path: env_var("CROSSPOST_CONTENT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_content_path),
            ledger_path: env_var("CROSSPOST_LEDGER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_ledger_path),
            completion_flag_path: env_var("CROSSPOST_COMPLETION_FLAG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_completion_flag_path),
        };

        let attempt_timeout_secs = env_var("CROSSPOST_ATTEMPT_TIMEOUT")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(default_attempt_timeout_secs);

        let targets = TargetsConfig {
            devto: env_var("DEVTO_TOKEN").map(DevtoConfig::new),
            hashnode: env_var("HASHNODE_TOKEN").map(|token| {
                HashnodeConfig::new(token, env_var("HASHNODE_PUBLICATION_ID").unwrap_or_default())
            }),
            gitlab: env_var("GITLAB_TOKEN").map(|token| {
                let config = GitlabConfig::new(token);
                match env_var("CROSSPOST_AUTHOR") {
                    Some(author) => config.with_author(author),
                    None => config,
                }
            }),
            webhooks: env_var("CROSSPOST_WEBHOOK_URL")
                .map(|url| {
                    let id = env_var("CROSSPOST_WEBHOOK_ID")
                        .unwrap_or_else(|| String::from("webhook"));
                    let config = WebhookConfig::new(id, url);
                    match env_var("CROSSPOST_WEBHOOK_TOKEN") {
                        Some(token) => vec![config.with_auth_token(token)],
                        None => vec![config],
                    }
                })
                .unwrap_or_default(),
        };

        let logging = LoggingConfig {
            level: env_var("CROSSPOST_LOG_LEVEL").unwrap_or_else(default_log_level),
            format: env_var("CROSSPOST_LOG_FORMAT").unwrap_or_else(default_log_format),
        };

        Ok(Self {
            campaign: CampaignConfig {
                start_date,
                cadence,
                daily_item_count,
                publish_time,
                timezone,
            },
            storage,
            dispatch: DispatchConfig {
                attempt_timeout_secs,
            },
            targets,
            logging,
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise from the environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.campaign.start_date.is_none() {
            anyhow::bail!("start_date is required (set campaign.start_date or CROSSPOST_START_DATE)");
        }

        if self.campaign.daily_item_count == 0 {
            anyhow::bail!("daily_item_count must be greater than 0");
        }

        self.publish_time()?;
        self.timezone()?;

        if self.dispatch.attempt_timeout_secs == 0 {
            anyhow::bail!("attempt_timeout_secs must be greater than 0");
        }

        for webhook in &self.targets.webhooks {
            webhook
                .validate()
                .map_err(|e| anyhow::anyhow!("webhook '{}': {e}", webhook.id))?;
        }

        for (name, timeout) in [
            ("devto", self.targets.devto.as_ref().map(|c| c.timeout_secs)),
            ("hashnode", self.targets.hashnode.as_ref().map(|c| c.timeout_secs)),
            ("gitlab", self.targets.gitlab.as_ref().map(|c| c.timeout_secs)),
        ] {
            if timeout == Some(0) {
                anyhow::bail!("{name}.timeout_secs must be greater than 0");
            }
        }

        Ok(())
    }

    /// Parsed publish time
    pub fn publish_time(&self) -> Result<NaiveTime> {
        let value = self.campaign.publish_time.trim();
        NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
            SchedulerError::InvalidPublishTime {
                value: value.to_string(),
            }
            .into()
        })
    }

    /// Parsed timezone
    pub fn timezone(&self) -> Result<Tz> {
        self.campaign.timezone.parse::<Tz>().map_err(|_| {
            SchedulerError::InvalidTimezone {
                tz: self.campaign.timezone.clone(),
            }
            .into()
        })
    }

    /// Build the immutable schedule parameters for a run
    pub fn schedule_config(&self) -> Result<ScheduleConfig> {
        let start_date = self
            .campaign
            .start_date
            .context("start_date is required (set campaign.start_date or CROSSPOST_START_DATE)")?;

        let schedule = ScheduleConfig::new(start_date, self.campaign.cadence)
            .with_daily_item_count(self.campaign.daily_item_count)
            .with_publish_time(self.publish_time()?)
            .with_timezone(self.timezone()?);
        schedule.validate()?;
        Ok(schedule)
    }

    /// Get attempt timeout as Duration
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch.attempt_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.campaign.start_date = NaiveDate::from_ymd_opt(2026, 2, 11);
        config
    }

    #[test]
    fn test_default_config_requires_start_date() {
        assert!(Config::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_invalid_daily_item_count() {
        let mut config = valid();
        config.campaign.daily_item_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_publish_time_and_timezone() {
        let mut config = valid();
        config.campaign.publish_time = "9am".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchedulerError>(),
            Some(SchedulerError::InvalidPublishTime { .. })
        ));

        let mut config = valid();
        config.campaign.timezone = "Mars/Olympus".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchedulerError>(),
            Some(SchedulerError::InvalidTimezone { .. })
        ));
    }

    #[test]
    fn test_invalid_webhook_rejected() {
        let mut config = valid();
        config.targets.webhooks.push(WebhookConfig::new("q", "not a url"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schedule_config_conversion() {
        let mut config = valid();
        config.campaign.cadence = Cadence::EveryOtherDay;
        config.campaign.publish_time = "07:30".to_string();
        config.campaign.timezone = "Europe/Berlin".to_string();

        let schedule = config.schedule_config().unwrap();
        assert_eq!(schedule.cadence, Cadence::EveryOtherDay);
        assert_eq!(schedule.publish_time, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(schedule.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(schedule.daily_item_count, 2);
    }

    #[test]
    fn test_attempt_timeout_conversion() {
        assert_eq!(valid().attempt_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [campaign]
            start_date = "2026-02-11"
            cadence = "every_other_day"

            [targets.devto]
            api_key = "secret"

            [[targets.webhooks]]
            id = "linkedin-queue"
            url = "https://hooks.example.com/linkedin"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.campaign.cadence, Cadence::EveryOtherDay);
        assert_eq!(config.campaign.daily_item_count, 2);
        assert_eq!(config.storage.ledger_path, PathBuf::from("logs/publish_status.json"));
        assert_eq!(config.targets.webhooks[0].location_field, "url");
        assert!(config.validate().is_ok());
    }
}
