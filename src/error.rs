// src/error.rs

//! Unified error handling for the leaderboard sync engine.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
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

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Roster file missing or malformed
    #[error("Failed to load rider directory {path}: {message}")]
    DirectoryLoad { path: String, message: String },

    /// Upstream responded, but not with what we asked for
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// Start-lanes source could not be read from either the network or disk
    #[error("Start lanes unavailable from {0}")]
    LanesUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A cycle panicked or failed outside any isolated scope
    #[error("Cycle error: {0}")]
    Cycle(String),
}

impl AppError {
    /// Create a directory load error for the given roster path.
    pub fn directory_load(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::DirectoryLoad {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a cycle-level error.
    pub fn cycle(message: impl Into<String>) -> Self {
        Self::Cycle(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_load_mentions_path() {
        let err = AppError::directory_load("/tmp/riders.csv", "missing header");
        let text = err.to_string();
        assert!(text.contains("/tmp/riders.csv"));
        assert!(text.contains("missing header"));
    }

    #[test]
    fn fetch_error_display() {
        let err = AppError::fetch("Men Pro", "status 500");
        assert_eq!(err.to_string(), "Fetch error for Men Pro: status 500");
    }
}
