//! Error handling for the visitor parking client

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Unified error type for the visitor parking client
#[derive(Error, Debug)]
pub enum Error {
    /// Network failure before a response was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the API
    #[error("{0}")]
    Status(HttpError),

    /// 2xx response whose envelope reported a non-200 `StatusCode`
    #[error("Request rejected with status code {status_code}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status_code: i64,
        message: Option<String>,
    },

    /// Missing or invalid session at a guarded operation
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A referenced catalog entity could not be found or created
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Input rejected locally or by the server
    #[error("Validation error: {0}")]
    Validation(String),

    /// Durable storage read/write failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Filesystem errors from durable storage
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A non-success HTTP response
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: u16,
    /// Response body, or the canonical status phrase when the body was empty
    pub body: String,
    /// Structured error body, decoded once from `body`
    pub detail: Option<ApiErrorBody>,
}

impl HttpError {
    pub fn new(status: u16, body: String) -> Self {
        let detail = serde_json::from_str::<ApiErrorBody>(&body).ok();
        let body = if body.trim().is_empty() {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown status")
                .to_string()
        } else {
            body
        };

        Self {
            status,
            body,
            detail,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.body)
    }
}

/// Structured error body the API returns on failures
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(alias = "Title")]
    pub title: Option<String>,

    #[serde(alias = "Error")]
    pub error: Option<String>,

    #[serde(alias = "Message")]
    pub message: Option<String>,

    /// Field-level validation failures
    #[serde(default, alias = "Errors")]
    pub errors: HashMap<String, Vec<String>>,
}

impl ApiErrorBody {
    /// First non-empty message, preferring the title
    pub fn summary(&self) -> Option<String> {
        [&self.title, &self.error, &self.message]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.first_field_error())
    }

    fn first_field_error(&self) -> Option<String> {
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        fields
            .into_iter()
            .flat_map(|(_, messages)| messages.iter())
            .map(|m| m.trim())
            .find(|m| !m.is_empty())
            .map(str::to_string)
    }
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new resolution error
    pub fn resolution<T: fmt::Display>(msg: T) -> Self {
        Error::Resolution(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new cache error
    pub fn cache<T: fmt::Display>(msg: T) -> Self {
        Error::Cache(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Whether the failure came from the network or the HTTP status
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Status(_))
    }

    /// Whether the failure carries field-level validation messages
    pub fn is_validation(&self) -> bool {
        match self {
            Error::Validation(_) => true,
            Error::Status(e) => {
                e.status == 400 && e.detail.as_ref().is_some_and(|d| !d.errors.is_empty())
            }
            _ => false,
        }
    }

    /// Human-readable message for display, falling back to `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            Error::Status(e) => e.detail.as_ref().and_then(ApiErrorBody::summary),
            Error::Rejected { message, .. } => message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            Error::Auth(m) | Error::Resolution(m) | Error::Validation(m) => Some(m.clone()),
            _ => None,
        };
        message.unwrap_or_else(|| fallback.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
