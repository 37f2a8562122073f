//! Local store error handling
//!
//! Provides typed errors for local store operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during local store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite error outside of commit
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Commit failed; the transaction's changes were discarded
    #[error("Failed to save changes (discarded): {0}")]
    Commit(#[source] rusqlite::Error),

    /// No movie with this identifier exists locally
    #[error("Movie not found: {0}")]
    NotFound(Uuid),

    /// A stored row could not be turned back into a movie
    #[error("Invalid stored movie '{id}': {details}")]
    InvalidRow { id: String, details: String },
}

impl StoreError {
    fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            StoreError::Database(e) | StoreError::Commit(e) => e.sqlite_error_code(),
            _ => None,
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self.sqlite_code() {
            Some(ErrorCode::DiskFull) => return Some("Free up disk space and try again."),
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                return Some("Another process is using the database. Try again shortly.")
            }
            Some(ErrorCode::ReadOnly | ErrorCode::PermissionDenied) => {
                return Some("Check file and directory permissions for the data directory.")
            }
            _ => {}
        }

        match self {
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ => None,
        }
    }
}

/// Result type for local store operations
pub type StoreResult<T> = Result<T, StoreError>;
