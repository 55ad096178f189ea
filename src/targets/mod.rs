//! Publishing targets
//!
//! A target is one independent destination (a blogging platform, a snippet
//! host, a webhook) behind the uniform [`PublishTarget`] capability: attempt to
//! publish an item, return where it landed or why it did not.
//!
//! ```text
//!                  ┌──────────────────────┐
//!                  │    TargetRegistry    │
//!                  │  id → PublishTarget  │
//!                  └──────────┬───────────┘
//!         ┌──────────┬────────┴──┬────────────┐
//!         ▼          ▼           ▼            ▼
//!    ┌────────┐ ┌──────────┐ ┌────────┐ ┌─────────┐
//!    │ Dev.to │ │ Hashnode │ │ GitLab │ │ Webhook │
//!    └────────┘ └──────────┘ └────────┘ └─────────┘
//! ```
//!
//! Adding a destination means implementing [`PublishTarget`] and registering
//! it; the dispatcher never branches on target names.

pub mod devto;
pub mod gitlab;
pub mod hashnode;
pub mod registry;
pub mod webhook;

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

use crate::models::ContentItem;

pub use devto::{DevtoConfig, DevtoTarget};
pub use gitlab::{GitlabConfig, GitlabTarget};
pub use hashnode::{HashnodeConfig, HashnodeTarget};
pub use registry::TargetRegistry;
pub use webhook::{WebhookConfig, WebhookTarget};

/// Result type for target operations
pub type TargetResult<T> = Result<T, TargetError>;

/// Errors that can occur while publishing to a target
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Credentials or settings missing
    #[error("Target not configured: {0}")]
    NotConfigured(String),

    /// Invalid target configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Target answered with a non-success status
    #[error("Rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Success status but the location could not be extracted
    #[error("Unexpected response: {0}")]
    MalformedResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The attempt did not finish in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Generic error
    #[error("Target error: {0}")]
    Other(String),
}

impl TargetError {
    /// Check if a later run may succeed without operator action
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::RateLimited(_) | Self::Timeout(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Uniform publish capability implemented by every target
///
/// Implementations must tolerate being called for an item that is already
/// published elsewhere, and must bound their own network time.
#[async_trait]
pub trait PublishTarget: Send + Sync {
    /// Target identifier as used in the content set (e.g. `"devto"`)
    fn id(&self) -> &str;

    /// Publish an item, returning its public location
    async fn publish(&self, item: &ContentItem) -> TargetResult<String>;

    /// Target configuration as JSON, secrets omitted
    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id(),
        })
    }
}

pub(crate) fn default_timeout() -> u64 {
    30
}

/// Build an HTTP client with a request timeout
pub(crate) fn build_client(timeout_secs: u64) -> TargetResult<Client> {
    if timeout_secs == 0 {
        return Err(TargetError::InvalidConfig(
            "Timeout must be greater than 0".to_string(),
        ));
    }

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("crosspost/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TargetError::Other(format!("Failed to create HTTP client: {e}")))
}

/// Turn a non-success response into an error, keeping a short body excerpt
pub(crate) async fn error_from_response(response: Response) -> TargetError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());
    let body = crate::utils::truncate_text(&body, 300);

    if status.as_u16() == 429 {
        TargetError::RateLimited(body)
    } else {
        TargetError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

/// Reject an empty required credential
pub(crate) fn require(value: &str, what: &str) -> TargetResult<()> {
    if value.trim().is_empty() {
        return Err(TargetError::NotConfigured(format!("{what} is empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(TargetError::Timeout(Duration::from_secs(5)).is_recoverable());
        assert!(TargetError::RateLimited("slow down".into()).is_recoverable());
        assert!(TargetError::Rejected {
            status: 503,
            body: String::new()
        }
        .is_recoverable());
        assert!(!TargetError::Rejected {
            status: 422,
            body: String::new()
        }
        .is_recoverable());
        assert!(!TargetError::NotConfigured("token".into()).is_recoverable());
    }

    #[test]
    fn test_build_client_rejects_zero_timeout() {
        assert!(matches!(
            build_client(0),
            Err(TargetError::InvalidConfig(_))
        ));
        assert!(build_client(10).is_ok());
    }

    #[test]
    fn test_require() {
        assert!(require("abc", "token").is_ok());
        assert!(matches!(
            require("  ", "token"),
            Err(TargetError::NotConfigured(_))
        ));
    }
}
