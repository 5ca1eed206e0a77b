//! Collaborators of the scraper pipeline.
//!
//! - [`FeedSource`]: lists recent pastes and fetches their bodies
//!   (`PastebinFeed`)
//! - [`Notifier`]: delivers match alerts and error reports
//!   (`WebhookNotifier`, `ConsoleNotifier`)
//!
//! Every network-bound method receives the process-wide cancellation token.

mod console;
mod pastebin;
mod webhook;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Alert, PasteItem};
use crate::utils::truncate;

pub use console::ConsoleNotifier;
pub use pastebin::PastebinFeed;
pub use webhook::WebhookNotifier;

/// Maximum number of body characters included in an alert.
pub const BODY_PREVIEW_CHARS: usize = 2000;

/// Source of recently added pastes.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// List the most recent pastes, newest first as the feed returns them.
    async fn list_recent(&self, cancel: &CancellationToken) -> Result<Vec<PasteItem>>;

    /// Fetch the raw body of one paste.
    async fn fetch_body(&self, cancel: &CancellationToken, key: &str) -> Result<String>;
}

/// Delivery backend for alerts.
///
/// Failures are returned to the caller and never retried here.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an alert for a matching paste.
    async fn send_match(&self, cancel: &CancellationToken, alert: &Alert) -> Result<()>;

    /// Deliver an error report.
    async fn send_error(&self, cancel: &CancellationToken, error: &AppError) -> Result<()>;

    /// Return the backend name (e.g., `"webhook"`).
    fn name(&self) -> &str;
}

/// One-line summary of an alert.
pub fn format_subject(alert: &Alert) -> String {
    let rules: Vec<&str> = alert.result.matches.keys().map(String::as_str).collect();
    format!(
        "Found paste {} matching {}",
        alert.item.display_title(),
        rules.join(", ")
    )
}

/// Render an alert as a human-readable message.
pub fn format_alert(alert: &Alert) -> String {
    let item = &alert.item;
    let mut out = format_subject(alert);
    out.push('\n');

    out.push_str(&format!(
        "URL: {}\n",
        item.full_url.as_deref().unwrap_or(&item.key)
    ));
    if let Some(user) = item.user.as_deref().filter(|u| !u.is_empty()) {
        out.push_str(&format!("User: {user}\n"));
    }
    if let Some(posted_at) = item.posted_at {
        out.push_str(&format!("Posted: {}\n", posted_at.format("%Y-%m-%d %H:%M:%S UTC")));
    }

    out.push_str("\nMatches:\n");
    for (rule, text) in &alert.result.matches {
        out.push_str(&format!("  {rule}: {text}\n"));
    }

    out.push_str("\nContent:\n");
    out.push_str(&truncate(&alert.body, BODY_PREVIEW_CHARS));
    out
}

/// Render an error report.
pub fn format_error(error: &AppError) -> String {
    format!("Pastewatch error: {error}")
}
