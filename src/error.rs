//! Error types for the GitHub collector
//!
//! Every public API returns `Result<T, Error>`. The collection core only ever
//! produces the five request kinds (`Network`, `RateLimitExceeded`, `Auth`,
//! `HttpStatus`, `Cancelled`); the remaining variants belong to configuration,
//! decoding and export.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Longest body excerpt carried by an error
pub const BODY_EXCERPT_LEN: usize = 200;

/// The main error type for the collector
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error("Network error on {method} {path}: {message}")]
    Network {
        method: String,
        path: String,
        message: String,
    },

    #[error("Rate limit exceeded on {method} {path}{}", format_reset(.reset_at))]
    RateLimitExceeded {
        method: String,
        path: String,
        reset_at: Option<DateTime<Utc>>,
    },

    #[error("Authentication failed on {method} {path} (HTTP {status}): {body}")]
    Auth {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("HTTP {status} on {method} {path}: {body}")]
    HttpStatus {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("Collection cancelled")]
    Cancelled,

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

fn format_reset(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(", resets at {}", at.to_rfc3339()),
        None => String::new(),
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(
        method: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Network {
            method: method.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(
        method: impl Into<String>,
        path: impl Into<String>,
        reset_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self::RateLimitExceeded {
            method: method.into(),
            path: path.into(),
            reset_at,
        }
    }

    /// Create an HTTP status error, choosing `Auth` for 401/403
    pub fn from_status(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        body: &str,
    ) -> Self {
        let method = method.into();
        let path = path.into();
        let body = excerpt(body);
        if matches!(status, 401 | 403) {
            Self::Auth {
                method,
                path,
                status,
                body,
            }
        } else {
            Self::HttpStatus {
                method,
                path,
                status,
                body,
            }
        }
    }

    /// Create a decode error
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the failure was transient, i.e. the whole call may be retried later
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network { .. } | Error::RateLimitExceeded { .. } => true,
            Error::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Truncate a response body to at most [`BODY_EXCERPT_LEN`] characters
pub fn excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Result type alias for the collector
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
