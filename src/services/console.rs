//! Notifier that prints alerts instead of sending them.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::Alert;
use crate::services::{Notifier, format_alert, format_error};

/// Writes alerts to stdout. Used by `--test` and when no webhook is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_match(&self, _cancel: &CancellationToken, alert: &Alert) -> Result<()> {
        println!("{}\n{}", format_alert(alert), "─".repeat(60));
        Ok(())
    }

    async fn send_error(&self, _cancel: &CancellationToken, error: &AppError) -> Result<()> {
        println!("{}", format_error(error));
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
