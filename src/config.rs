//! Configuration options for the parking client

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the API base URL
pub const ENV_API_BASE: &str = "PARKING_API_BASE";
/// Environment variable holding the durable storage directory
pub const ENV_STORAGE_DIR: &str = "PARKING_STORAGE_DIR";
/// Environment variable holding the request timeout in seconds
pub const ENV_REQUEST_TIMEOUT: &str = "PARKING_REQUEST_TIMEOUT_SECS";

/// Configuration options for the parking client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL every API path is appended to
    pub base_url: String,

    /// The request timeout. `None` (the default) lets a request run until
    /// the server answers. An elapsed timeout fails the request with
    /// `Error::Http`, which counts as a transport error.
    pub request_timeout: Option<Duration>,

    /// Directory for the session and offline cache; in-memory when unset
    pub storage_dir: Option<PathBuf>,
}

impl ClientOptions {
    /// Create options for the given API base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
            storage_dir: None,
        }
    }

    /// Load options from `PARKING_API_BASE`, `PARKING_STORAGE_DIR` and
    /// `PARKING_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_API_BASE)
            .map_err(|_| Error::config(format!("{} environment variable not found", ENV_API_BASE)))?;
        Url::parse(&base_url)?;

        let mut options = Self::new(&base_url);

        if let Ok(dir) = std::env::var(ENV_STORAGE_DIR) {
            options = options.with_storage_dir(dir);
        }

        if let Ok(secs) = std::env::var(ENV_REQUEST_TIMEOUT) {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::config(format!("{} must be a whole number of seconds", ENV_REQUEST_TIMEOUT))
            })?;
            options = options.with_request_timeout(Some(Duration::from_secs(secs)));
        }

        Ok(options)
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Persist the session and offline cache under `dir`
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Build the HTTP client these options describe
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}
