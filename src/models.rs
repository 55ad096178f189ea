//! Core data structures for the content campaign
//!
//! A campaign is a fixed, ordered set of [`ContentItem`]s. Each item carries
//! its `day` number (the campaign's ordering key, not a calendar date) and
//! the list of targets it must be published to.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or validating the content set
#[derive(Error, Debug)]
pub enum ContentError {
    /// The content file could not be read
    #[error("Failed to read content file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The content file is not valid JSON for the item shape
    #[error("Failed to parse content file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The content set contains no items
    #[error("Content set is empty")]
    Empty,

    /// Day numbers start at 1
    #[error("Invalid day number {day}: days start at 1")]
    InvalidDay { day: u32 },

    /// The same day number appears twice
    #[error("Duplicate day number {day}")]
    DuplicateDay { day: u32 },

    /// Day numbers must form 1..=N without holes
    #[error("Day numbers are not dense: day {missing} is missing")]
    MissingDay { missing: u32 },

    /// An item has no publishing targets
    #[error("Day {day} has no targets")]
    NoTargets { day: u32 },

    /// An item lists the same target twice
    #[error("Day {day} lists target '{target}' more than once")]
    DuplicateTarget { day: u32, target: String },

    /// An item has an empty title
    #[error("Day {day} has an empty title")]
    EmptyTitle { day: u32 },
}

/// A single piece of content scheduled for publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Campaign day number (1-based, unique)
    pub day: u32,

    /// Title
    pub title: String,

    /// Markdown body
    pub body: String,

    /// Ordered tags; targets may truncate or normalise them
    #[serde(default)]
    pub tags: Vec<String>,

    /// Targets this item must be published to
    #[serde(default, alias = "platforms")]
    pub targets: Vec<String>,
}

impl ContentItem {
    /// Create a new content item
    pub fn new(
        day: u32,
        title: impl Into<String>,
        body: impl Into<String>,
        tags: Vec<String>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            day,
            title: title.into(),
            body: body.into(),
            tags,
            targets,
        }
    }

    /// Configured targets as a set
    pub fn target_set(&self) -> BTreeSet<&str> {
        self.targets.iter().map(String::as_str).collect()
    }

    /// First `limit` tags, in order
    pub fn tags_limited(&self, limit: usize) -> &[String] {
        &self.tags[..self.tags.len().min(limit)]
    }

    /// Approximate word count of the body
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }

    fn validate(&self) -> Result<(), ContentError> {
        if self.day == 0 {
            return Err(ContentError::InvalidDay { day: self.day });
        }
        if self.title.trim().is_empty() {
            return Err(ContentError::EmptyTitle { day: self.day });
        }
        if self.targets.is_empty() {
            return Err(ContentError::NoTargets { day: self.day });
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.as_str()) {
                return Err(ContentError::DuplicateTarget {
                    day: self.day,
                    target: target.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Immutable, validated collection of content items
///
/// Items keep the order they were loaded in; day numbers are guaranteed to be
/// unique and to cover `1..=len()`.
#[derive(Debug, Clone)]
pub struct ContentSet {
    items: Vec<ContentItem>,
}

impl ContentSet {
    /// Build a content set, validating every item and the day sequence
    pub fn new(items: Vec<ContentItem>) -> Result<Self, ContentError> {
        if items.is_empty() {
            return Err(ContentError::Empty);
        }

        for item in &items {
            item.validate()?;
        }

        let mut days: Vec<u32> = items.iter().map(|i| i.day).collect();
        days.sort_unstable();
        for (idx, day) in days.iter().enumerate() {
            let expected = idx as u32 + 1;
            if *day < expected {
                return Err(ContentError::DuplicateDay { day: *day });
            }
            if *day > expected {
                return Err(ContentError::MissingDay { missing: expected });
            }
        }

        Ok(Self { items })
    }

    /// Load and validate a content set from a JSON file
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let content = std::fs::read_to_string(path).map_err(|source| ContentError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&content).map_err(|e| match e {
            ContentError::Parse { source, .. } => ContentError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse and validate a content set from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let items: Vec<ContentItem> =
            serde_json::from_str(json).map_err(|source| ContentError::Parse {
                path: "<inline>".to_string(),
                source,
            })?;
        Self::new(items)
    }

    /// Items in content-set order
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Look up an item by day number
    pub fn get(&self, day: u32) -> Option<&ContentItem> {
        self.items.iter().find(|i| i.day == day)
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a validated set
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Highest day number
    pub fn last_day(&self) -> u32 {
        self.items.len() as u32
    }

    /// Every distinct target referenced by any item
    pub fn all_targets(&self) -> BTreeSet<&str> {
        self.items
            .iter()
            .flat_map(|i| i.targets.iter().map(String::as_str))
            .collect()
    }
}
