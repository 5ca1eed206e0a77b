// src/models/mod.rs

//! Domain models for the scraper.
//!
//! This module contains the configuration structures and the data passed
//! between the feed, the matcher and the notifiers.

mod config;
mod paste;

// Re-export all public types
pub use config::{Config, FeedConfig, KeywordConfig, KeywordType, NotificationConfig};
pub use paste::{Alert, MatchResult, PasteItem};
