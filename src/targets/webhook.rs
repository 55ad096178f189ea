//! Webhook target
//!
//! Posts the item as JSON to an HTTP endpoint and reads the published location
//! from the JSON response. Useful for destinations without a dedicated client,
//! such as a queue feeding a manual posting workflow.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    build_client, default_timeout, error_from_response, PublishTarget, TargetError, TargetResult,
};
use crate::models::ContentItem;

fn default_location_field() -> String {
    "url".to_string()
}

/// Webhook target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Target identifier used in the content set
    pub id: String,

    /// Webhook URL endpoint
    pub url: String,

    /// Optional authentication token (sent as Bearer token)
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Custom headers to include in requests
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response field holding the published location
    #[serde(default = "default_location_field")]
    pub location_field: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl WebhookConfig {
    /// Create a new webhook configuration
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            auth_token: None,
            headers: HashMap::new(),
            location_field: default_location_field(),
            timeout_secs: default_timeout(),
        }
    }

    /// Set authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response field holding the location
    pub fn with_location_field(mut self, field: impl Into<String>) -> Self {
        self.location_field = field.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Webhook id cannot be empty".to_string());
        }

        let parsed = url::Url::parse(&self.url).map_err(|e| format!("Invalid webhook URL: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Webhook publishing target
///
/// # Payload Format
///
/// ```json
/// {
///   "target": "linkedin-queue",
///   "day": 3,
///   "title": "Article title",
///   "body": "Markdown body",
///   "tags": ["rust", "cli"]
/// }
/// ```
///
/// The endpoint answers with a JSON object whose `location_field` (default
/// `url`) holds the published location.
pub struct WebhookTarget {
    config: WebhookConfig,
    client: Client,
}

impl WebhookTarget {
    /// Create a new webhook target
    pub fn new(config: WebhookConfig) -> TargetResult<Self> {
        config.validate().map_err(TargetError::InvalidConfig)?;
        let client = build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Get the webhook URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn build_payload(&self, item: &ContentItem) -> serde_json::Value {
        serde_json::json!({
            "target": self.config.id,
            "day": item.day,
            "title": item.title,
            "body": item.body,
            "tags": item.tags,
        })
    }
}

#[async_trait]
impl PublishTarget for WebhookTarget {
    fn id(&self) -> &str {
        &self.config.id
    }

    async fn publish(&self, item: &ContentItem) -> TargetResult<String> {
        let mut request = self.client.post(&self.config.url);

        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request.json(&self.build_payload(item)).send().await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: serde_json::Value = response.json().await?;
        let location = body
            .get(&self.config.location_field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                TargetError::MalformedResponse(format!(
                    "missing '{}' field",
                    self.config.location_field
                ))
            })?;

        tracing::info!(
            day = item.day,
            target_id = %self.config.id,
            url = %location,
            "Webhook publish accepted"
        );
        Ok(location)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.config.id,
            "url": self.config.url,
            "timeout_secs": self.config.timeout_secs,
            "has_auth": self.config.auth_token.is_some(),
            "custom_headers": self.config.headers.keys().collect::<Vec<_>>(),
            "location_field": self.config.location_field,
        })
    }
}
