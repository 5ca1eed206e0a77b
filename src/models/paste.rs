//! Paste and match result data structures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A paste listed by the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PasteItem {
    /// Opaque feed key
    pub key: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Time the paste was posted
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,

    /// Syntax highlighting language declared by the author
    #[serde(default)]
    pub syntax: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    /// Size in bytes as reported by the feed
    #[serde(default)]
    pub size: Option<u64>,

    /// Public URL of the paste
    #[serde(default)]
    pub full_url: Option<String>,
}

impl PasteItem {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Title for display, falling back to the key.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => self.key.as_str(),
        }
    }
}

/// Rules that matched one paste body, keyed by rule identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MatchResult {
    /// Rule identifier to the text that triggered it
    pub matches: BTreeMap<String, String>,
}

impl MatchResult {
    /// Whether at least one rule matched.
    pub fn any_match(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn record(&mut self, rule: impl Into<String>, text: impl Into<String>) {
        self.matches.insert(rule.into(), text.into());
    }

    pub fn get(&self, rule: &str) -> Option<&str> {
        self.matches.get(rule).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// A fetched paste that matched at least one rule.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Alert {
    pub item: PasteItem,
    pub body: String,
    pub result: MatchResult,
}
