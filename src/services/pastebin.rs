// src/services/pastebin.rs

//! Pastebin scraping API client.
//!
//! Lists recent pastes as JSON and fetches raw bodies by key. The scraping
//! API only answers whitelisted IPs; other callers get a plain-text notice
//! with status 200, which is reported as a listing error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{FeedConfig, PasteItem};
use crate::services::FeedSource;
use crate::utils::http::{cancellable, create_async_client, get_text};
use crate::utils::truncate;

const MISSING_PASTE: &str = "Error, we cannot find this paste";

/// Listing entry as returned by the API; every field is a string.
#[derive(Debug, Deserialize)]
struct RawPaste {
    key: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    size: String,
    #[serde(default)]
    syntax: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    full_url: String,
}

impl From<RawPaste> for PasteItem {
    fn from(raw: RawPaste) -> Self {
        fn non_empty(s: String) -> Option<String> {
            if s.trim().is_empty() { None } else { Some(s) }
        }

        let posted_at = raw
            .date
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        PasteItem {
            key: raw.key,
            title: non_empty(raw.title),
            posted_at,
            syntax: non_empty(raw.syntax),
            user: non_empty(raw.user),
            size: raw.size.trim().parse().ok(),
            full_url: non_empty(raw.full_url),
        }
    }
}

/// Feed backed by the Pastebin scraping API.
pub struct PastebinFeed {
    config: FeedConfig,
    client: Client,
}

impl PastebinFeed {
    /// Create a new feed client with the given configuration.
    pub fn new(config: FeedConfig, timeout: std::time::Duration) -> Result<Self> {
        let client = create_async_client(&config.user_agent, timeout)?;
        Ok(Self { config, client })
    }

    fn list_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.config.list_url)?;
        url.query_pairs_mut()
            .append_pair("limit", &self.config.limit.to_string());
        Ok(url)
    }

    fn item_url(&self, key: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.config.item_url)?;
        url.query_pairs_mut().append_pair("i", key);
        Ok(url)
    }

    /// Parse a listing response body.
    fn parse_listing(body: &str) -> Result<Vec<PasteItem>> {
        let trimmed = body.trim_start();
        if !trimmed.starts_with('[') {
            return Err(AppError::list(format!(
                "unexpected response: {}",
                truncate(trimmed, 120)
            )));
        }
        let raw: Vec<RawPaste> = serde_json::from_str(trimmed)?;
        Ok(raw.into_iter().map(PasteItem::from).collect())
    }
}

#[async_trait]
impl FeedSource for PastebinFeed {
    async fn list_recent(&self, cancel: &CancellationToken) -> Result<Vec<PasteItem>> {
        let url = self.list_url()?;
        let body = cancellable(cancel, get_text(&self.client, url)).await?;
        Self::parse_listing(&body)
    }

    async fn fetch_body(&self, cancel: &CancellationToken, key: &str) -> Result<String> {
        let url = self.item_url(key)?;
        let body = cancellable(cancel, get_text(&self.client, url)).await?;
        if body.starts_with(MISSING_PASTE) {
            return Err(AppError::fetch(key, "paste no longer exists"));
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"[
        {
            "scrape_url": "https://scrape.pastebin.com/api_scrape_item.php?i=AbC123",
            "full_url": "https://pastebin.com/AbC123",
            "date": "1582289291",
            "key": "AbC123",
            "size": "2310",
            "expire": "0",
            "title": "",
            "syntax": "text",
            "user": ""
        },
        { "key": "XyZ789", "title": "dump" }
    ]"#;

    #[test]
    fn test_parse_listing() {
        let items = PastebinFeed::parse_listing(LISTING).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.key, "AbC123");
        assert_eq!(first.title, None);
        assert_eq!(first.user, None);
        assert_eq!(first.size, Some(2310));
        assert_eq!(first.syntax.as_deref(), Some("text"));
        assert_eq!(
            first.posted_at.map(|t| t.timestamp()),
            Some(1_582_289_291)
        );

        assert_eq!(items[1].title.as_deref(), Some("dump"));
        assert_eq!(items[1].posted_at, None);
    }

    #[test]
    fn test_parse_listing_access_denied() {
        let body = "YOUR IP: 203.0.113.9 DOES NOT HAVE ACCESS. VISIT: https://pastebin.com/doc_scraping_api";
        let result = PastebinFeed::parse_listing(body);
        match result {
            Err(AppError::List(message)) => assert!(message.contains("DOES NOT HAVE ACCESS")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_parse_listing_broken_json() {
        assert!(matches!(
            PastebinFeed::parse_listing("[{\"key\": }]"),
            Err(AppError::Json(_))
        ));
    }

    #[test]
    fn test_urls() {
        let feed = PastebinFeed::new(FeedConfig::default(), std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(
            feed.list_url().unwrap().as_str(),
            "https://scrape.pastebin.com/api_scraping.php?limit=100"
        );
        assert_eq!(
            feed.item_url("AbC123").unwrap().as_str(),
            "https://scrape.pastebin.com/api_scrape_item.php?i=AbC123"
        );
    }
}
