// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Failure of a single backend call.
///
/// Every variant is recoverable: the caller decides whether to surface it,
/// retry on user request, or substitute a fallback.  Nothing in this crate
/// retries automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Transport-level failure: connection refused, reset, deadline expired.
    #[error("network failure: {0}")]
    Network(String),

    /// The service answered with a structured error.
    #[error("{0}")]
    Rejected(String),

    /// The response did not have the expected shape.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// Error returned by [`crate::DocumentClient::submit`].
pub type UploadError = BackendError;

/// Error returned by [`crate::ChatClient::ask`].
pub type ChatError = BackendError;

impl BackendError {
    /// Short tag for logs and status lines.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendError::Network(_) => "network",
            BackendError::Rejected(_) => "rejected",
            BackendError::Protocol(_) => "protocol",
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Network(format!("request timed out: {e}"))
        } else {
            BackendError::Network(e.to_string())
        }
    }
}
