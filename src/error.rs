// src/error.rs

//! Unified error handling for the scraper.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// `Config` is fatal at startup. `List`, `Fetch` and `Delivery` are
/// recoverable and travel over the error channel to the error worker.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Pattern compilation failed
    #[error("Invalid pattern for rule '{rule}': {message}")]
    Pattern { rule: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listing recent pastes failed
    #[error("fetchPasteList: {0}")]
    List(String),

    /// Fetching a single paste body failed
    #[error("fetch {key}: {message}")]
    Fetch { key: String, message: String },

    /// Sending a notification failed
    #[error("{notifier}: {message}")]
    Delivery { notifier: String, message: String },

    /// The operation was aborted by the cancellation token
    #[error("operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a pattern compilation error.
    pub fn pattern(rule: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Pattern {
            rule: rule.into(),
            message: message.to_string(),
        }
    }

    /// Create a listing error.
    pub fn list(message: impl fmt::Display) -> Self {
        Self::List(message.to_string())
    }

    /// Create a fetch error for a paste key.
    pub fn fetch(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error for a notifier.
    pub fn delivery(notifier: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            notifier: notifier.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error aborts startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Pattern { .. } | Self::Toml(_) | Self::Io(_)
        )
    }

    /// Process exit status: 2 for startup failures, 1 for anything else.
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() { 2 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            AppError::list("status 403").to_string(),
            "fetchPasteList: status 403"
        );
        assert_eq!(
            AppError::fetch("abc123", "timed out").to_string(),
            "fetch abc123: timed out"
        );
        assert_eq!(
            AppError::delivery("webhook", "status 500").to_string(),
            "webhook: status 500"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(AppError::config("bad timeout").is_fatal());
        assert!(AppError::pattern("x", "bad").is_fatal());
        assert!(!AppError::list("down").is_fatal());
        assert!(!AppError::Cancelled.is_fatal());
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(AppError::config("bad timeout").exit_code(), 2);
        assert_eq!(AppError::Cancelled.exit_code(), 1);
        assert_eq!(AppError::delivery("webhook", "status 500").exit_code(), 1);
    }
}
