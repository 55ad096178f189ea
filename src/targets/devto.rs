//! Dev.to target
//!
//! Publishes through the Forem REST API (`POST /api/articles`). Dev.to accepts
//! at most four tags, lowercase alphanumeric only.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    build_client, default_timeout, error_from_response, require, PublishTarget, TargetError,
    TargetResult,
};
use crate::models::ContentItem;
use crate::utils::normalize_tag;

/// Maximum tags accepted per article
pub const MAX_TAGS: usize = 4;

fn default_base_url() -> String {
    "https://dev.to".to_string()
}

/// Dev.to configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevtoConfig {
    /// API key from the Dev.to settings page
    pub api_key: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl DevtoConfig {
    /// Create a configuration with the public API endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }

    /// Override the API base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ArticleResponse {
    url: Option<String>,
}

/// Dev.to publishing target
pub struct DevtoTarget {
    config: DevtoConfig,
    client: Client,
}

impl DevtoTarget {
    /// Create a new Dev.to target
    pub fn new(config: DevtoConfig) -> TargetResult<Self> {
        require(&config.api_key, "DEVTO_TOKEN")?;
        let client = build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Tags as Dev.to accepts them
    pub fn tags_for(item: &ContentItem) -> Vec<String> {
        item.tags_limited(MAX_TAGS)
            .iter()
            .map(|t| normalize_tag(t))
            .filter(|t| !t.is_empty())
            .collect()
    }

    fn build_payload(&self, item: &ContentItem) -> serde_json::Value {
        serde_json::json!({
            "article": {
                "title": item.title,
                "published": true,
                "body_markdown": item.body,
                "tags": Self::tags_for(item),
            }
        })
    }
}

#[async_trait]
impl PublishTarget for DevtoTarget {
    fn id(&self) -> &str {
        "devto"
    }

    async fn publish(&self, item: &ContentItem) -> TargetResult<String> {
        let url = format!("{}/api/articles", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.config.api_key)
            .json(&self.build_payload(item))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: ArticleResponse = response.json().await?;
        let location = body
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| TargetError::MalformedResponse("missing 'url' field".to_string()))?;

        tracing::info!(day = item.day, url = %location, "Published to Dev.to");
        Ok(location)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id(),
            "base_url": self.config.base_url,
            "timeout_secs": self.config.timeout_secs,
        })
    }
}
