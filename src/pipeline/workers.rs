//! Long-lived consumers of the match and error queues.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::Alert;
use crate::services::Notifier;

/// Spawn the worker delivering alerts.
///
/// Delivery failures are forwarded to the error queue. Returns the number of
/// alerts delivered once the match queue is closed and drained.
pub fn spawn_match_worker(
    mut matches: mpsc::Receiver<Alert>,
    notifier: Arc<dyn Notifier>,
    errors: mpsc::Sender<AppError>,
    cancel: CancellationToken,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut delivered = 0;
        while let Some(alert) = matches.recv().await {
            log::debug!("found paste:\n{}", alert.item.key);
            match notifier.send_match(&cancel, &alert).await {
                Ok(()) => delivered += 1,
                Err(AppError::Cancelled) => {
                    log::warn!("shutting down, alert for {} not sent", alert.item.key);
                }
                Err(e) => {
                    let e = match e {
                        e @ AppError::Delivery { .. } => e,
                        other => AppError::delivery(notifier.name(), other),
                    };
                    if let Err(lost) = errors.send(e).await {
                        log::error!("{}", lost.0);
                    }
                }
            }
        }
        log::debug!("match worker finished after {delivered} alerts");
        delivered
    })
}

/// Spawn the worker logging every error.
///
/// With `report_to` set, each error is also sent through that notifier; a
/// failure there is only logged. Returns the number of errors handled.
pub fn spawn_error_worker(
    mut errors: mpsc::Receiver<AppError>,
    report_to: Option<Arc<dyn Notifier>>,
    cancel: CancellationToken,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut handled = 0;
        while let Some(error) = errors.recv().await {
            handled += 1;
            log::error!("{error}");

            let Some(notifier) = &report_to else {
                continue;
            };
            if let Err(e) = notifier.send_error(&cancel, &error).await {
                log::error!("ERROR on sending error notification: {e}");
            }
        }
        log::debug!("error worker finished after {handled} errors");
        handled
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchResult, PasteItem};
    use crate::pipeline::mock::MockNotifier;

    fn alert(key: &str) -> Alert {
        let mut result = MatchResult::default();
        result.record("password", "password=1");
        Alert {
            item: PasteItem::new(key),
            body: "password=1".into(),
            result,
        }
    }

    #[tokio::test]
    async fn test_match_worker_delivers_in_order() {
        let notifier = Arc::new(MockNotifier::default());
        let alerts = notifier.alerts.clone();
        let (match_tx, match_rx) = mpsc::channel(4);
        let (error_tx, mut error_rx) = mpsc::channel(4);

        let handle = spawn_match_worker(match_rx, notifier, error_tx, CancellationToken::new());
        match_tx.send(alert("a")).await.unwrap();
        match_tx.send(alert("b")).await.unwrap();
        drop(match_tx);

        assert_eq!(handle.await.unwrap(), 2);
        let keys: Vec<String> = alerts
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.item.key.clone())
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(error_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_match_worker_escalates_delivery_failure() {
        let notifier = Arc::new(MockNotifier::failing());
        let (match_tx, match_rx) = mpsc::channel(4);
        let (error_tx, mut error_rx) = mpsc::channel(4);

        let handle = spawn_match_worker(match_rx, notifier, error_tx, CancellationToken::new());
        match_tx.send(alert("a")).await.unwrap();
        drop(match_tx);

        assert_eq!(handle.await.unwrap(), 0);
        let error = error_rx.recv().await.unwrap();
        assert!(matches!(error, AppError::Delivery { .. }));
        assert_eq!(error.to_string(), "mock: connection refused");
    }

    #[tokio::test]
    async fn test_error_worker_reports_when_enabled() {
        let notifier = Arc::new(MockNotifier::default());
        let reported = notifier.errors.clone();
        let (error_tx, error_rx) = mpsc::channel(4);

        let handle = spawn_error_worker(
            error_rx,
            Some(notifier as Arc<dyn Notifier>),
            CancellationToken::new(),
        );
        error_tx.send(AppError::list("status 500")).await.unwrap();
        error_tx.send(AppError::fetch("k", "timeout")).await.unwrap();
        drop(error_tx);

        assert_eq!(handle.await.unwrap(), 2);
        assert_eq!(
            *reported.lock().unwrap(),
            vec![
                "fetchPasteList: status 500".to_string(),
                "fetch k: timeout".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_error_worker_logs_only_when_disabled() {
        let (error_tx, error_rx) = mpsc::channel(4);
        let handle = spawn_error_worker(error_rx, None, CancellationToken::new());
        error_tx.send(AppError::list("down")).await.unwrap();
        drop(error_tx);

        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_error_worker_survives_report_failure() {
        let (error_tx, error_rx) = mpsc::channel(4);
        let handle = spawn_error_worker(
            error_rx,
            Some(Arc::new(MockNotifier::failing()) as Arc<dyn Notifier>),
            CancellationToken::new(),
        );
        error_tx.send(AppError::list("one")).await.unwrap();
        error_tx.send(AppError::list("two")).await.unwrap();
        drop(error_tx);

        assert_eq!(handle.await.unwrap(), 2);
    }
}
