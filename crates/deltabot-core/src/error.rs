//! Shared error type across deltabot crates.

use thiserror::Error;

/// Stable error kinds (used in log fields and by callers that branch on failures).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed line from the worker.
    Decode,
    /// Request could not be serialized.
    Encode,
    /// The worker answered with an error response.
    Remote,
    /// The transport is closed or its reader died.
    TransportClosed,
    /// Process or pipe I/O failure.
    Io,
    /// Invalid configuration file or value.
    Config,
    /// Contradictory event filter constraints.
    InvalidFilter,
    /// A hook callback failed.
    Hook,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Decode => "DECODE",
            ErrorKind::Encode => "ENCODE",
            ErrorKind::Remote => "REMOTE",
            ErrorKind::TransportClosed => "TRANSPORT_CLOSED",
            ErrorKind::Io => "IO",
            ErrorKind::Config => "CONFIG",
            ErrorKind::InvalidFilter => "INVALID_FILTER",
            ErrorKind::Hook => "HOOK",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BotError>;

/// Unified error type used by core, runtime and bots.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("transport closed")]
    TransportClosed,
    #[error("io: {0}")]
    Io(String),
    #[error("config: {0}")]
    Config(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("hook failed: {0}")]
    Hook(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl BotError {
    /// Map the error to its stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Decode(_) => ErrorKind::Decode,
            BotError::Encode(_) => ErrorKind::Encode,
            BotError::Remote { .. } => ErrorKind::Remote,
            BotError::TransportClosed => ErrorKind::TransportClosed,
            BotError::Io(_) => ErrorKind::Io,
            BotError::Config(_) => ErrorKind::Config,
            BotError::InvalidFilter(_) => ErrorKind::InvalidFilter,
            BotError::Hook(_) => ErrorKind::Hook,
            BotError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Build a `Remote` error from the `error` member of a response.
    ///
    /// The worker sends `{"code": <int>, "message": <string>}`; anything else
    /// is kept verbatim as the message with code 0.
    pub fn from_remote(error: &serde_json::Value) -> Self {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = match error.get("message").and_then(|m| m.as_str()) {
            Some(m) => m.to_string(),
            None => error.to_string(),
        };
        BotError::Remote { code, message }
    }
}

impl From<std::io::Error> for BotError {
    fn from(e: std::io::Error) -> Self {
        BotError::Io(e.to_string())
    }
}
