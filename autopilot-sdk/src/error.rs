//! Error types for backend operations
//!
//! Every failure a view can observe collapses into [`ApiError`], whose
//! `Display` output is the single message shown to the user.

use thiserror::Error;

/// Failure of a remote operation or of a client-side precondition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never completed (connect, timeout, broken body)
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response carrying the server's `detail` message
    #[error("{detail}")]
    Server { status: u16, detail: String },

    /// Client-side validation failed before anything was sent
    #[error("{0}")]
    Validation(String),

    /// A 2xx response whose body is not the documented JSON
    #[error("{0}")]
    Decode(String),

    /// A response that parsed but breaks a documented invariant
    #[error("{0}")]
    Contract(String),
}

impl ApiError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn server(status: u16, detail: impl Into<String>) -> Self {
        Self::Server {
            status,
            detail: detail.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Transport and server failures may clear up on the next attempt.
    ///
    /// The polling controller retries these silently on its next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }

    /// HTTP status of a server-reported failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for backend operations
pub type ApiResult<T> = Result<T, ApiError>;
