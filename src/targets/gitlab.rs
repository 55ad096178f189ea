//! GitLab snippet target
//!
//! Publishes an item as a public snippet holding one markdown file.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    build_client, default_timeout, error_from_response, require, PublishTarget, TargetError,
    TargetResult,
};
use crate::models::ContentItem;
use crate::utils::sanitize_filename;

const MAX_FILENAME_CHARS: usize = 80;

fn default_base_url() -> String {
    "https://gitlab.com".to_string()
}

/// GitLab configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitlabConfig {
    /// Personal access token with `api` scope
    pub token: String,

    /// Instance base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Author shown in the snippet description
    #[serde(default)]
    pub author: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GitlabConfig {
    /// Create a configuration for gitlab.com
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: default_base_url(),
            author: None,
            timeout_secs: default_timeout(),
        }
    }

    /// Override the instance base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the author shown in descriptions
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct SnippetResponse {
    web_url: Option<String>,
}

/// GitLab snippet publishing target
pub struct GitlabTarget {
    config: GitlabConfig,
    client: Client,
}

impl GitlabTarget {
    /// Create a new GitLab target
    pub fn new(config: GitlabConfig) -> TargetResult<Self> {
        require(&config.token, "GITLAB_TOKEN")?;
        let client = build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Markdown file name derived from the title
    pub fn filename_for(item: &ContentItem) -> String {
        let dashed: String = item
            .title
            .replace(' ', "-")
            .chars()
            .filter(|c| !matches!(c, '?' | ':' | '#'))
            .collect();
        let stem: String = sanitize_filename(&dashed)
            .chars()
            .take(MAX_FILENAME_CHARS)
            .collect();
        format!("{stem}.md")
    }

    fn build_payload(&self, item: &ContentItem) -> serde_json::Value {
        let tags_line: Vec<String> = item
            .tags
            .iter()
            .map(|t| format!("#{}", t.replace(' ', "")))
            .collect();
        let content = format!("# {}\n\n{}\n\n---\n{}", item.title, item.body, tags_line.join(" "));

        let topics = item.tags_limited(3).join(", ");
        let description = match &self.config.author {
            Some(author) => format!("By {author} - {topics}"),
            None => topics,
        };

        serde_json::json!({
            "title": item.title,
            "description": description,
            "visibility": "public",
            "files": [
                {
                    "file_path": Self::filename_for(item),
                    "content": content,
                }
            ]
        })
    }
}

#[async_trait]
impl PublishTarget for GitlabTarget {
    fn id(&self) -> &str {
        "gitlab"
    }

    async fn publish(&self, item: &ContentItem) -> TargetResult<String> {
        let url = format!(
            "{}/api/v4/snippets",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("PRIVATE-TOKEN", &self.config.token)
            .json(&self.build_payload(item))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: SnippetResponse = response.json().await?;
        let location = body.web_url.filter(|u| !u.is_empty()).ok_or_else(|| {
            TargetError::MalformedResponse("missing 'web_url' field".to_string())
        })?;

        tracing::info!(day = item.day, url = %location, "Published GitLab snippet");
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
