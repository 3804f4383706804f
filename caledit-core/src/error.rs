//! Error types for caledit.

use thiserror::Error;

/// Errors that can occur while parsing, resolving or syncing event records.
#[derive(Error, Debug)]
pub enum CalEditError {
    #[error("Malformed timestamp {input:?}: {reason}")]
    MalformedTimestamp { input: String, reason: String },

    #[error("Reminder: {0}. Invalid format, expected '<minutes> minutes by <method>'")]
    MalformedReminder(String),

    #[error("Invalid date format '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("No fetched event has id '{0}'")]
    UnknownEvent(String),

    #[error("Remote temporarily unavailable: {0}")]
    RemoteTransient(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Update failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("{0}")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CalEditError {
    /// Whether the failed remote call may succeed if attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RemoteTransient(_) | Self::ProviderTimeout(_))
    }

    /// A conflict carrying the provider's reason, or a generic one if the
    /// provider gave none.
    pub fn conflict(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if reason.trim().is_empty() {
            Self::Conflict("event conflicts with existing event".to_string())
        } else {
            Self::Conflict(reason)
        }
    }

    pub(crate) fn malformed_timestamp(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTimestamp {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for caledit operations.
pub type CalEditResult<T> = Result<T, CalEditError>;
