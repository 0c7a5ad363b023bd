//! Error types for the Formstack API client.
//!
//! # Design
//! Three outcomes are kept apart. Malformed caller input becomes
//! `InvalidArgument` before any request is built. A response outside the
//! 2xx range becomes `BadToken`, which keeps the remote service's historic
//! conflation of "bad credentials" with "any non-2xx status" in its message
//! while still carrying the status and body. Business-level rejections
//! (`{"status":"error", ...}` with a 2xx status) are not errors at all; they
//! come back as ordinary JSON.

use thiserror::Error;

/// Errors returned by `FormstackClient`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller input failed validation. The message is stable and may be
    /// matched on.
    #[error("{0}")]
    InvalidArgument(String),

    /// The server answered with a status outside [200, 300).
    #[error("Bad token")]
    BadToken { status: u16, body: String },

    /// The round-trip could not be completed (DNS, TLS, refused connection).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body was not JSON or lacked the expected field.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// Request parameters could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Client configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    /// The validation message, if this is a caller error.
    pub fn invalid_argument(&self) -> Option<&str> {
        match self {
            ApiError::InvalidArgument(msg) => Some(msg),
            _ => None,
        }
    }
}
