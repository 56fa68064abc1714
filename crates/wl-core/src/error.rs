//! Error types for workledger

use chrono::NaiveDateTime;
use thiserror::Error;

/// Main error type for workledger
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Bad user arguments; the command is aborted, the loop continues
    #[error("Validation error: {0}")]
    Validation(String),

    /// Session queried before it was started
    #[error("Session has not been started")]
    NotStarted,

    /// Finished session whose end lies before its start
    #[error("Session ends before it starts ({start} > {end})")]
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Authentication check failed: wrong password or corrupted file
    #[error("Decryption failed: wrong password or corrupted file")]
    Decryption,

    /// Malformed persisted data
    #[error("Format error: {0}")]
    Format(String),

    /// Command token outside the recognized vocabulary
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Recognized command without a bound handler
    #[error("Command '{0}' is registered but has no handler")]
    UnimplementedCommand(String),

    /// Password retries used up
    #[error("File is corrupt or password is incorrect ({attempts} attempts)")]
    PasswordAttemptsExhausted { attempts: u32 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<LedgerError>,
    },
}

impl LedgerError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        LedgerError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error must terminate the process.
    ///
    /// Only exhausted password retries and corrupt persisted data qualify;
    /// everything else is reported at the command boundary.
    pub fn is_fatal(&self) -> bool {
        match self {
            LedgerError::PasswordAttemptsExhausted { .. } | LedgerError::Format(_) => true,
            LedgerError::WithContext { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

/// Result type alias for workledger
pub type Result<T> = std::result::Result<T, LedgerError>;
