//! Unified application error type.
//! All modules (db, store, core, cli) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing / input errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid location code: {0}")]
    InvalidLocation(String),

    /// Bad manual-duration input. Recoverable: re-prompt.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not a recognized scan payload: {0}")]
    UnrecognizedPayload(String),

    // ---------------------------
    // Store-originated errors (shown verbatim)
    // ---------------------------
    /// The store refused the action for the currently persisted state.
    #[error("{message} [{code}]")]
    TransitionRejected { code: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    // ---------------------------
    // Internal conditions
    // ---------------------------
    /// A required input (e.g. the occupancy anchor) is not loaded yet.
    #[error("Not ready: {0}")]
    NotReady(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    pub fn rejected(code: &str, message: impl Into<String>) -> Self {
        AppError::TransitionRejected {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Transient failures: the user may retry, but nothing retries on its own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Network(_) | AppError::Timeout(_) | AppError::Unavailable(_)
        )
    }

    /// Conditions that are deferred silently instead of being shown.
    pub fn is_silent(&self) -> bool {
        matches!(self, AppError::NotReady(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
