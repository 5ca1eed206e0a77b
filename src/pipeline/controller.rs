// src/pipeline/controller.rs

//! Poll loop driving list → fetch → match → dispatch.
//!
//! Each cycle waits until `poll_interval` has passed since the previous
//! listing, lists recent pastes, fetches and matches every key not yet in
//! the seen-set (pausing `item_delay` after each fetch), then evicts expired
//! seen-set entries. Failures never stop the loop: they go to the error
//! channel and processing moves on.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Alert, Config, PasteItem};
use crate::rules::{RuleSet, evaluate};
use crate::services::FeedSource;
use crate::utils::http::cancellable;

use super::seen::SeenSet;

/// Timing of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Minimum time between two listings
    pub poll_interval: Duration,
    /// Age after which a seen key may be fetched again
    pub retention: Duration,
    /// Pause after each body fetch
    pub item_delay: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            retention: Duration::from_secs(600),
            item_delay: Duration::from_secs(1),
        }
    }
}

impl From<&Config> for ControllerSettings {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            retention: config.retention(),
            item_delay: config.item_delay(),
        }
    }
}

/// Counters for one poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleStats {
    pub list_failed: bool,
    pub listed: usize,
    pub skipped: usize,
    pub fetched: usize,
    pub failed: usize,
    pub matched: usize,
    pub evicted: usize,
}

/// Owns the seen-set and the poll schedule.
pub struct Controller {
    feed: Arc<dyn FeedSource>,
    rules: Arc<RuleSet>,
    settings: ControllerSettings,
    seen: SeenSet,
    last_check: Option<Instant>,
    matches: mpsc::Sender<Alert>,
    errors: mpsc::Sender<AppError>,
    cancel: CancellationToken,
}

impl Controller {
    pub fn new(
        feed: Arc<dyn FeedSource>,
        rules: Arc<RuleSet>,
        settings: ControllerSettings,
        matches: mpsc::Sender<Alert>,
        errors: mpsc::Sender<AppError>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            feed,
            rules,
            settings,
            seen: SeenSet::new(),
            last_check: None,
            matches,
            errors,
            cancel,
        }
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Run cycles until the cancellation token fires.
    ///
    /// Dropping the controller afterwards closes both channels, which lets the
    /// workers drain and exit.
    pub async fn run(mut self) {
        log::info!("Starting paste watcher with {} rules", self.rules.len());
        loop {
            match self.run_cycle().await {
                Ok(stats) => log::debug!("cycle finished: {stats:?}"),
                Err(AppError::Cancelled) => break,
                Err(e) => log::error!("cycle aborted: {e}"),
            }
        }
        log::info!("Paste watcher stopped");
    }

    /// Run one WAIT → LIST → process → EVICT cycle.
    ///
    /// Only returns an error when cancelled.
    pub async fn run_cycle(&mut self) -> Result<CycleStats> {
        self.wait_for_poll().await?;
        self.last_check = Some(Instant::now());

        let mut stats = CycleStats::default();
        let items = match cancellable(&self.cancel, self.feed.list_recent(&self.cancel)).await {
            Ok(items) => items,
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => {
                stats.list_failed = true;
                self.report(into_list_error(e)).await?;
                return Ok(stats);
            }
        };
        stats.listed = items.len();

        for item in items {
            if self.seen.has(&item.key) {
                log::debug!("skipping key {} as it was already checked", item.key);
                stats.skipped += 1;
                continue;
            }
            self.seen.mark(&item.key);

            stats.fetched += 1;
            match self.process(item).await {
                Ok(Some(alert)) => {
                    stats.matched += 1;
                    self.dispatch(alert).await?;
                }
                Ok(None) => {}
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => {
                    stats.failed += 1;
                    self.report(e).await?;
                }
            }

            self.pause(self.settings.item_delay).await?;
        }

        stats.evicted = self.evict();
        Ok(stats)
    }

    /// Fetch one paste body and match it.
    async fn process(&self, item: PasteItem) -> Result<Option<Alert>> {
        let body = cancellable(&self.cancel, self.feed.fetch_body(&self.cancel, &item.key))
            .await
            .map_err(|e| into_fetch_error(&item.key, e))?;

        let result = evaluate(&body, &self.rules);
        if !result.any_match() {
            return Ok(None);
        }
        log::info!(
            "paste {} matched {} rule(s)",
            item.key,
            result.len()
        );
        Ok(Some(Alert { item, body, result }))
    }

    async fn wait_for_poll(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let Some(last) = self.last_check else {
            return Ok(());
        };

        let due = last + self.settings.poll_interval;
        if due > Instant::now() {
            log::debug!("sleeping for {:?}", due - Instant::now());
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(AppError::Cancelled),
                _ = tokio::time::sleep_until(due) => {}
            }
        }
        Ok(())
    }

    async fn pause(&self, delay: Duration) -> Result<()> {
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AppError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn evict(&mut self) -> usize {
        match Instant::now().checked_sub(self.settings.retention) {
            Some(threshold) => self.seen.evict_older_than(threshold),
            None => 0,
        }
    }

    /// Queue an alert, waiting while the queue is full.
    async fn dispatch(&self, alert: Alert) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AppError::Cancelled),
            sent = self.matches.send(alert) => {
                if let Err(e) = sent {
                    log::error!("match worker is gone, dropping alert for {}", e.0.item.key);
                }
                Ok(())
            }
        }
    }

    /// Queue an error report, waiting while the queue is full.
    async fn report(&self, error: AppError) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AppError::Cancelled),
            sent = self.errors.send(error) => {
                if let Err(e) = sent {
                    log::error!("{}", e.0);
                }
                Ok(())
            }
        }
    }
}

fn into_list_error(error: AppError) -> AppError {
    match error {
        e @ (AppError::List(_) | AppError::Cancelled) => e,
        other => AppError::list(other),
    }
}

fn into_fetch_error(key: &str, error: AppError) -> AppError {
    match error {
        e @ (AppError::Fetch { .. } | AppError::Cancelled) => e,
        other => AppError::fetch(key, other),
    }
}
