//! Error types for presenca-client
//!
//! `ClientError` covers the authenticated backend operations (login, profile,
//! report...). The scan pipeline has its own types in [`crate::scan`] and
//! [`crate::client::attendance`] because every scan failure is resolved into a
//! user-facing message instead of being propagated.

use thiserror::Error;

/// Backend operation error
#[derive(Debug, Error)]
pub enum ClientError {
    /// No stored session token, or the backend refused it (401)
    #[error("Not authenticated: log in again")]
    Unauthenticated,

    /// Backend refused the request and explained why
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Non-2xx response without a readable message
    #[error("Backend returned HTTP {0}")]
    Status(u16),

    /// Connection, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// 2xx response whose body could not be interpreted
    #[error("Invalid backend response: {0}")]
    Decode(String),

    /// Invalid user input, rejected before any request is made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// presenca-common error
    #[error(transparent)]
    Common(#[from] presenca_common::Error),
}

/// Result type for backend operations
pub type ClientResult<T> = Result<T, ClientError>;

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
