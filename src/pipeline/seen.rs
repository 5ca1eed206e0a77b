//! Time-windowed set of already processed paste keys.

use std::collections::HashMap;

use tokio::time::Instant;

/// Paste keys with the time they were first seen.
///
/// Owned by the controller and only touched from its loop. Entries expire
/// when [`SeenSet::evict_older_than`] runs, once per poll cycle.
#[derive(Debug, Default)]
pub struct SeenSet {
    entries: HashMap<String, Instant>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Record `key` as seen now. Returns `false` if it was already present.
    pub fn mark(&mut self, key: &str) -> bool {
        self.mark_at(key, Instant::now())
    }

    /// Record `key` as seen at `at`; an existing entry keeps its first time.
    pub fn mark_at(&mut self, key: &str, at: Instant) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(key.to_string(), at);
        true
    }

    /// Time `key` was first seen.
    pub fn seen_at(&self, key: &str) -> Option<Instant> {
        self.entries.get(key).copied()
    }

    /// Remove every entry marked before `threshold`. Returns the number removed.
    pub fn evict_older_than(&mut self, threshold: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, seen| {
            if *seen < threshold {
                log::debug!("deleting expired entry {key}");
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
