//! Error types for the Ordr.in API client.
//!
//! # Design
//! Callers need to tell "fix your input" apart from "the service or the
//! network failed". `BadValue` is raised before any request leaves the
//! process and always carries every violation found, never just the first.
//! `Transport` and `Remote` come back from a round-trip and are passed
//! through unchanged; the client never retries.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OrdrinError>;

/// Errors returned by the Ordr.in client.
#[derive(Debug, Error)]
pub enum OrdrinError {
    /// One or more inputs failed validation. The list is never empty.
    #[error("invalid input: {}", .0.join("; "))]
    BadValue(Vec<String>),

    /// The HTTP layer could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The service answered with an error payload or an error status.
    #[error("remote error (HTTP {status}): {message}")]
    Remote {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    /// A successful response body was not valid JSON.
    #[error("response could not be decoded: {0}")]
    Decode(String),

    /// The client was configured incorrectly.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OrdrinError {
    /// Build a `BadValue` holding a single message.
    pub fn bad_value(message: impl Into<String>) -> Self {
        Self::BadValue(vec![message.into()])
    }

    pub fn is_bad_value(&self) -> bool {
        matches!(self, Self::BadValue(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Validation messages carried by a `BadValue`, empty for other kinds.
    pub fn messages(&self) -> &[String] {
        match self {
            Self::BadValue(messages) => messages,
            _ => &[],
        }
    }
}
