//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::parse_duration;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Timeout for every outbound HTTP call, e.g. `"30s"` or `"1500ms"`
    #[serde(default = "defaults::timeout")]
    pub timeout: String,

    /// Also send a notification for every reported error
    #[serde(default, alias = "mailonerror")]
    pub mail_on_error: bool,

    /// Minimum time between two listing requests
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// How long a paste key stays in the seen-set
    #[serde(default = "defaults::retention")]
    pub retention_secs: u64,

    /// Pause after each paste body fetch
    #[serde(default = "defaults::item_delay")]
    pub item_delay_ms: u64,

    /// Capacity of the match and error queues
    #[serde(default = "defaults::channel_capacity")]
    pub channel_capacity: usize,

    /// Paste feed endpoints
    #[serde(default)]
    pub feed: FeedConfig,

    /// Alert delivery settings
    #[serde(default)]
    pub notification: NotificationConfig,

    /// Rule definitions
    #[serde(default)]
    pub keywords: Vec<KeywordConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("could not read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.timeout()?;
        if self.poll_interval_secs == 0 {
            return Err(AppError::config("poll_interval_secs must be > 0"));
        }
        if self.retention_secs == 0 {
            return Err(AppError::config("retention_secs must be > 0"));
        }
        if self.channel_capacity == 0 {
            return Err(AppError::config("channel_capacity must be > 0"));
        }
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::config("feed.user_agent is empty"));
        }
        if self.feed.limit == 0 {
            return Err(AppError::config("feed.limit must be > 0"));
        }
        url::Url::parse(&self.feed.list_url)
            .map_err(|e| AppError::config(format!("invalid feed.list_url: {e}")))?;
        url::Url::parse(&self.feed.item_url)
            .map_err(|e| AppError::config(format!("invalid feed.item_url: {e}")))?;
        if let Some(webhook) = &self.notification.webhook_url {
            url::Url::parse(webhook).map_err(|e| {
                AppError::config(format!("invalid notification.webhook_url: {e}"))
            })?;
        }
        Ok(())
    }

    /// Parsed network timeout.
    pub fn timeout(&self) -> Result<Duration> {
        match parse_duration(&self.timeout) {
            Some(d) if !d.is_zero() => Ok(d),
            _ => Err(AppError::config(format!(
                "invalid value for timeout: {:?}",
                self.timeout
            ))),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: defaults::timeout(),
            mail_on_error: false,
            poll_interval_secs: defaults::poll_interval(),
            retention_secs: defaults::retention(),
            item_delay_ms: defaults::item_delay(),
            channel_capacity: defaults::channel_capacity(),
            feed: FeedConfig::default(),
            notification: NotificationConfig::default(),
            keywords: Vec::new(),
        }
    }
}

/// Paste feed endpoints and client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Endpoint returning the most recent pastes as JSON
    #[serde(default = "defaults::list_url")]
    pub list_url: String,

    /// Endpoint returning the raw body of one paste
    #[serde(default = "defaults::item_url")]
    pub item_url: String,

    /// Number of pastes requested per listing
    #[serde(default = "defaults::limit")]
    pub limit: u32,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            list_url: defaults::list_url(),
            item_url: defaults::item_url(),
            limit: defaults::limit(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Alert delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotificationConfig {
    /// Webhook receiving JSON alerts. Alerts are only logged when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Kind of a configured rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeywordType {
    #[default]
    Literal,
    Cidr,
}

/// A single rule definition as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordConfig {
    pub keyword: String,

    #[serde(default, rename = "type")]
    pub kind: KeywordType,

    #[serde(default)]
    pub exceptions: Vec<String>,
}

impl KeywordConfig {
    pub fn literal(keyword: impl Into<String>, exceptions: &[&str]) -> Self {
        Self {
            keyword: keyword.into(),
            kind: KeywordType::Literal,
            exceptions: exceptions.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn cidr(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            kind: KeywordType::Cidr,
            exceptions: Vec::new(),
        }
    }
}

mod defaults {
    pub fn timeout() -> String {
        "30s".into()
    }
    pub fn poll_interval() -> u64 {
        60
    }
    pub fn retention() -> u64 {
        600
    }
    pub fn item_delay() -> u64 {
        1000
    }
    pub fn channel_capacity() -> usize {
        64
    }

    // Feed defaults
    pub fn list_url() -> String {
        "https://scrape.pastebin.com/api_scraping.php".into()
    }
    pub fn item_url() -> String {
        "https://scrape.pastebin.com/api_scrape_item.php".into()
    }
    pub fn limit() -> u32 {
        100
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; pastewatch/0.1)".into()
    }
}
