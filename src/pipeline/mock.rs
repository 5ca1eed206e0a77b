//! In-memory collaborators for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Alert, PasteItem};
use crate::services::{FeedSource, Notifier};

/// Feed replaying scripted listings; an exhausted script lists nothing.
#[derive(Default)]
pub struct MockFeed {
    listings: Mutex<VecDeque<std::result::Result<Vec<PasteItem>, String>>>,
    bodies: HashMap<String, std::result::Result<String, String>>,
    pub list_calls: Mutex<usize>,
    pub fetch_calls: Mutex<Vec<String>>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(self, keys: &[&str]) -> Self {
        let items = keys.iter().map(|k| PasteItem::new(*k)).collect();
        self.listings.lock().unwrap().push_back(Ok(items));
        self
    }

    pub fn failing_listing(self, message: &str) -> Self {
        self.listings
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn body(mut self, key: &str, body: &str) -> Self {
        self.bodies.insert(key.to_string(), Ok(body.to_string()));
        self
    }

    pub fn failing_body(mut self, key: &str, message: &str) -> Self {
        self.bodies.insert(key.to_string(), Err(message.to_string()));
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for MockFeed {
    async fn list_recent(&self, _cancel: &CancellationToken) -> Result<Vec<PasteItem>> {
        *self.list_calls.lock().unwrap() += 1;
        match self.listings.lock().unwrap().pop_front() {
            Some(Ok(items)) => Ok(items),
            Some(Err(message)) => Err(AppError::list(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_body(&self, _cancel: &CancellationToken, key: &str) -> Result<String> {
        self.fetch_calls.lock().unwrap().push(key.to_string());
        match self.bodies.get(key) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(message)) => Err(AppError::fetch(key, message)),
            None => Ok(String::new()),
        }
    }
}

/// Notifier collecting what it was asked to deliver.
#[derive(Default)]
pub struct MockNotifier {
    pub alerts: Arc<Mutex<Vec<Alert>>>,
    pub errors: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

impl MockNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send_match(&self, _cancel: &CancellationToken, alert: &Alert) -> Result<()> {
        if self.fail {
            return Err(AppError::delivery(self.name(), "connection refused"));
        }
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }

    async fn send_error(&self, _cancel: &CancellationToken, error: &AppError) -> Result<()> {
        if self.fail {
            return Err(AppError::delivery(self.name(), "connection refused"));
        }
        self.errors.lock().unwrap().push(error.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
