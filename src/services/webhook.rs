//! JSON webhook notifier.

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::Alert;
use crate::services::{Notifier, format_alert, format_error, format_subject};
use crate::utils::http::{cancellable, create_async_client};

/// Posts alerts as JSON to a webhook URL.
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, user_agent: &str, timeout: std::time::Duration) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            client: create_async_client(user_agent, timeout)?,
        })
    }

    fn alert_payload(alert: &Alert) -> serde_json::Value {
        serde_json::json!({
            "subject": format_subject(alert),
            "text": format_alert(alert),
            "paste": alert.item,
            "matches": alert.result.matches,
        })
    }

    fn error_payload(error: &AppError) -> serde_json::Value {
        serde_json::json!({
            "subject": "Pastewatch error",
            "text": format_error(error),
        })
    }

    async fn post(&self, cancel: &CancellationToken, payload: serde_json::Value) -> Result<()> {
        let send = async {
            let resp = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| AppError::delivery(self.name(), e))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_else(|_| "unknown".to_string());
                return Err(AppError::delivery(
                    self.name(),
                    format!("webhook returned {}: {}", status, body),
                ));
            }
            Ok(())
        };
        cancellable(cancel, send).await
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_match(&self, cancel: &CancellationToken, alert: &Alert) -> Result<()> {
        self.post(cancel, Self::alert_payload(alert)).await
    }

    async fn send_error(&self, cancel: &CancellationToken, error: &AppError) -> Result<()> {
        self.post(cancel, Self::error_payload(error)).await
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
