//! Pipeline entry points.
//!
//! - `Controller`: the poll loop owning the seen-set
//! - `spawn_match_worker` / `spawn_error_worker`: queue consumers
//! - `run_pipeline`: wires the three together and runs until cancelled
//!
//! Both queues are bounded `mpsc` channels. A full queue blocks the
//! producer, so slow delivery throttles polling instead of dropping alerts.

pub mod controller;
pub mod seen;
pub mod workers;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::rules::RuleSet;
use crate::services::{FeedSource, Notifier};

pub use controller::{Controller, ControllerSettings, CycleStats};
pub use seen::SeenSet;
pub use workers::{spawn_error_worker, spawn_match_worker};

/// Wiring options for [`run_pipeline`].
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub settings: ControllerSettings,
    pub channel_capacity: usize,
    /// Also send every reported error through the notifier
    pub mail_on_error: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            settings: ControllerSettings::default(),
            channel_capacity: 64,
            mail_on_error: false,
        }
    }
}

/// What the workers handled before shutdown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub alerts_delivered: usize,
    pub errors_handled: usize,
}

/// Run the controller and both workers until `cancel` fires, then wait for
/// the workers to drain their queues.
pub async fn run_pipeline(
    feed: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
    rules: Arc<RuleSet>,
    options: PipelineOptions,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let capacity = options.channel_capacity.max(1);
    let (match_tx, match_rx) = mpsc::channel(capacity);
    let (error_tx, error_rx) = mpsc::channel(capacity);

    let match_worker = spawn_match_worker(
        match_rx,
        Arc::clone(&notifier),
        error_tx.clone(),
        cancel.clone(),
    );
    let report_to = options.mail_on_error.then(|| Arc::clone(&notifier));
    let error_worker = spawn_error_worker(error_rx, report_to, cancel.clone());

    let controller = Controller::new(feed, rules, options.settings, match_tx, error_tx, cancel);
    controller.run().await;

    let alerts_delivered = match_worker.await.unwrap_or_else(|e| {
        log::error!("match worker panicked: {e}");
        0
    });
    let errors_handled = error_worker.await.unwrap_or_else(|e| {
        log::error!("error worker panicked: {e}");
        0
    });

    Ok(RunSummary {
        alerts_delivered,
        errors_handled,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::KeywordConfig;
    use crate::pipeline::mock::{MockFeed, MockNotifier};

    #[tokio::test(start_paused = true)]
    async fn test_run_pipeline_end_to_end() {
        let feed = MockFeed::new()
            .listing(&["a", "b", "a"])
            .failing_listing("status 502")
            .listing(&["c"])
            .body("a", "contact ip 10.5.5.5 for access")
            .body("b", "my password is at example.com/docs")
            .failing_body("c", "reset by peer");
        let notifier = Arc::new(MockNotifier::default());
        let alerts = notifier.alerts.clone();
        let reported = notifier.errors.clone();
        let rules = RuleSet::compile(&[
            KeywordConfig::cidr("10.0.0.0/8"),
            KeywordConfig::literal("password", &["example.com"]),
        ])
        .unwrap();
        let options = PipelineOptions {
            mail_on_error: true,
            ..PipelineOptions::default()
        };
        let cancel = CancellationToken::new();

        let feed = Arc::new(feed);
        let run = tokio::spawn(run_pipeline(
            feed.clone(),
            notifier,
            Arc::new(rules),
            options,
            cancel.clone(),
        ));
        // cycles at t=0, 60 and 120
        tokio::time::sleep(Duration::from_secs(150)).await;
        cancel.cancel();
        let summary = run.await.unwrap().unwrap();

        assert_eq!(feed.fetched(), vec!["a", "b", "c"]);
        assert_eq!(summary.alerts_delivered, 1);
        assert_eq!(summary.errors_handled, 2);

        let alerts = alerts.lock().unwrap();
        assert_eq!(alerts[0].item.key, "a");
        assert_eq!(alerts[0].result.get("10.0.0.0/8"), Some("10.5.5.5"));
        assert_eq!(
            *reported.lock().unwrap(),
            vec!["fetchPasteList: status 502", "fetch c: reset by peer"]
        );
    }
}
