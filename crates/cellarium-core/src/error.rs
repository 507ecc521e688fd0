// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Cellarium client core.

use thiserror::Error;

use crate::response::HttpFailure;

/// The primary error type used across the catalog API, the HTTP client, and
/// the add-wine wizard.
#[derive(Debug, Error)]
pub enum CellarError {
    /// Login or token refresh was rejected by the backend, or no refresh
    /// token was available.
    #[error("authentication failed: {message}")]
    Auth {
        message: String,
        /// HTTP status of the rejected call, if the backend answered at all.
        status: Option<u16>,
    },

    /// Non-2xx response after any automatic retry.
    #[error("{0}")]
    Http(HttpFailure),

    /// The request never produced an HTTP response (connection refused,
    /// DNS failure, timeout).
    #[error("network error: {message}")]
    Network {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A successful response could not be mapped onto the expected domain type.
    #[error("failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    /// Persisted token storage could not be read or written.
    #[error("token storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid base URL, bad header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Client-side draft validation failed (missing wine name, rating out of range).
    #[error("{0}")]
    Validation(String),

    /// A wizard action was requested in a step where it does not apply.
    #[error("`{action}` is not available in the {step} step")]
    InvalidTransition {
        action: &'static str,
        step: &'static str,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CellarError {
    /// Returns the structured HTTP failure, if this error carries one.
    pub fn http_failure(&self) -> Option<&HttpFailure> {
        match self {
            CellarError::Http(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CellarError::Http(failure) => Some(failure.status),
            CellarError::Auth { status, .. } => *status,
            _ => None,
        }
    }

    /// Convenience constructor for transport failures.
    pub fn network(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CellarError::Network {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<HttpFailure> for CellarError {
    fn from(failure: HttpFailure) -> Self {
        CellarError::Http(failure)
    }
}
