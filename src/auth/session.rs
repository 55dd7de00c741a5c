//! Session data for an authenticated resident

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session returned by the login endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The bearer token
    #[serde(rename = "Token", default)]
    pub token: String,

    /// The resident's display name
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Any other fields the server returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Session {
    /// Create a session holding only a token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Whether the session carries a usable token
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}
