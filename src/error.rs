//! Error types for the dashboard client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::SessionId;

/// Errors that can occur while talking to the document API or managing
/// local dashboard state.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// The response body was missing fields or was not the expected shape.
    #[error("Malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    /// The current identity may not perform the action.
    #[error("Not permitted: {0}")]
    Forbidden(String),

    /// An operation required an active session and none was selected.
    #[error("No active session selected")]
    NoActiveSession,

    /// The referenced session does not exist on the server.
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    /// Input rejected before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file error: {0}")]
    State(String),
}

impl ApiError {
    /// Whether this is a "not found" answer from the server.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
