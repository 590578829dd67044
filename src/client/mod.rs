//! Client side of the follow button: talks to the HTTP API, keeps a local
//! cache and reconciles its state with relay events.

pub mod api;
pub mod cache;
pub mod widget;

use std::fmt;

pub use api::{FollowApi, HttpFollowApi};
pub use cache::{CachedFollow, FileFollowCache, FollowCache};
pub use widget::{FollowWidget, StateSource, WidgetState};

#[derive(Debug)]
pub enum WidgetError {
    Http(String),
    /// Server answered with a non-2xx status
    Rejected { status: u16, message: String },
    Cache(String),
}

impl fmt::Display for WidgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetError::Http(msg) => write!(f, "HTTP error: {}", msg),
            WidgetError::Rejected { status, message } => write!(f, "Rejected ({}): {}", status, message),
            WidgetError::Cache(msg) => write!(f, "Cache error: {}", msg),
        }
    }
}

impl std::error::Error for WidgetError {}

impl From<reqwest::Error> for WidgetError {
    fn from(err: reqwest::Error) -> Self {
        WidgetError::Http(err.to_string())
    }
}

impl From<std::io::Error> for WidgetError {
    fn from(err: std::io::Error) -> Self {
        WidgetError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for WidgetError {
    fn from(err: serde_json::Error) -> Self {
        WidgetError::Cache(err.to_string())
    }
}
