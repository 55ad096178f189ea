//! Hashnode target
//!
//! Publishes through the Hashnode GraphQL API (`publishPost` mutation).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    build_client, default_timeout, error_from_response, require, PublishTarget, TargetError,
    TargetResult,
};
use crate::models::ContentItem;
use crate::utils::slugify;

/// Maximum tags sent per post
pub const MAX_TAGS: usize = 5;

const PUBLISH_MUTATION: &str = r#"
mutation PublishPost($input: PublishPostInput!) {
    publishPost(input: $input) {
        post {
            url
            title
        }
    }
}
"#;

fn default_endpoint() -> String {
    "https://gql.hashnode.com".to_string()
}

/// Hashnode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashnodeConfig {
    /// Personal access token
    pub token: String,

    /// Publication the posts belong to
    pub publication_id: String,

    /// GraphQL endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl HashnodeConfig {
    /// Create a configuration with the public endpoint
    pub fn new(token: impl Into<String>, publication_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            publication_id: publication_id.into(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout(),
        }
    }

    /// Override the GraphQL endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<PublishData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishData {
    publish_post: Option<PublishPost>,
}

#[derive(Debug, Deserialize)]
struct PublishPost {
    post: PostRef,
}

#[derive(Debug, Deserialize)]
struct PostRef {
    url: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// Hashnode publishing target
pub struct HashnodeTarget {
    config: HashnodeConfig,
    client: Client,
}

impl HashnodeTarget {
    /// Create a new Hashnode target
    pub fn new(config: HashnodeConfig) -> TargetResult<Self> {
        require(&config.token, "HASHNODE_TOKEN")?;
        require(&config.publication_id, "HASHNODE_PUBLICATION_ID")?;
        let client = build_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    fn build_request(&self, item: &ContentItem) -> serde_json::Value {
        let tags: Vec<serde_json::Value> = item
            .tags_limited(MAX_TAGS)
            .iter()
            .map(|tag| serde_json::json!({ "slug": slugify(tag), "name": tag }))
            .collect();

        serde_json::json!({
            "query": PUBLISH_MUTATION,
            "variables": {
                "input": {
                    "title": item.title,
                    "contentMarkdown": item.body,
                    "tags": tags,
                    "publicationId": self.config.publication_id,
                }
            }
        })
    }
}

#[async_trait]
impl PublishTarget for HashnodeTarget {
    fn id(&self) -> &str {
        "hashnode"
    }

    async fn publish(&self, item: &ContentItem) -> TargetResult<String> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", &self.config.token)
            .json(&self.build_request(item))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: GraphqlResponse = response.json().await?;

        if let Some(post) = body.data.and_then(|d| d.publish_post) {
            tracing::info!(day = item.day, url = %post.post.url, "Published to Hashnode");
            return Ok(post.post.url);
        }

        // GraphQL reports failures with HTTP 200 and an errors array
        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(TargetError::Rejected {
                status: 200,
                body: messages.join("; "),
            });
        }

        Err(TargetError::MalformedResponse(
            "missing publishPost.post.url".to_string(),
        ))
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id(),
            "endpoint": self.config.endpoint,
            "publication_id": self.config.publication_id,
            "timeout_secs": self.config.timeout_secs,
        })
    }
}
