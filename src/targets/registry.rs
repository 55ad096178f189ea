//! Target registry
//!
//! Maps target identifiers to publish capabilities.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    DevtoTarget, GitlabTarget, HashnodeTarget, PublishTarget, TargetError, TargetResult,
    WebhookTarget,
};
use crate::config::TargetsConfig;

/// Registry of publish capabilities keyed by target id
#[derive(Default, Clone)]
pub struct TargetRegistry {
    targets: HashMap<String, Arc<dyn PublishTarget>>,
}

impl TargetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration
    ///
    /// A target whose credentials are empty is left out with a warning; the
    /// dispatcher then reports it as a failure for every item that needs it.
    /// Malformed settings are an error.
    pub fn from_config(config: &TargetsConfig) -> TargetResult<Self> {
        let mut registry = Self::new();

        if let Some(devto) = &config.devto {
            registry.register_built("devto", DevtoTarget::new(devto.clone()))?;
        }
        if let Some(hashnode) = &config.hashnode {
            registry.register_built("hashnode", HashnodeTarget::new(hashnode.clone()))?;
        }
        if let Some(gitlab) = &config.gitlab {
            registry.register_built("gitlab", GitlabTarget::new(gitlab.clone()))?;
        }
        for webhook in &config.webhooks {
            registry.register_built(&webhook.id, WebhookTarget::new(webhook.clone()))?;
        }

        tracing::info!(targets = ?registry.ids(), "Target registry initialised");
        Ok(registry)
    }

    fn register_built<T: PublishTarget + 'static>(
        &mut self,
        id: &str,
        built: TargetResult<T>,
    ) -> TargetResult<()> {
        match built {
            Ok(target) => {
                self.register(target);
                Ok(())
            }
            Err(TargetError::NotConfigured(reason)) => {
                tracing::warn!(target_id = id, reason = %reason, "Target not configured, skipping");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Register a target, replacing any target with the same id
    pub fn register(
        &mut self,
        target: impl PublishTarget + 'static,
    ) -> Option<Arc<dyn PublishTarget>> {
        self.register_arc(Arc::new(target))
    }

    /// Register a shared target
    pub fn register_arc(
        &mut self,
        target: Arc<dyn PublishTarget>,
    ) -> Option<Arc<dyn PublishTarget>> {
        let id = target.id().to_string();
        let previous = self.targets.insert(id.clone(), target);
        if previous.is_some() {
            tracing::warn!(target_id = %id, "Replaced previously registered target");
        }
        previous
    }

    /// Look up a target
    pub fn get(&self, id: &str) -> Option<Arc<dyn PublishTarget>> {
        self.targets.get(id).cloned()
    }

    /// Check whether a target is registered
    pub fn contains(&self, id: &str) -> bool {
        self.targets.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl std::fmt::Debug for TargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRegistry")
            .field("targets", &self.ids())
            .finish()
    }
}
