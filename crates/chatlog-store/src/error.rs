use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The contact database is missing from the storage root.
    #[error("Database not found: {}", .0.display())]
    NotFound(PathBuf),

    /// No message database holds a row for the conversation.
    #[error("No messages found for {0}")]
    NoMessages(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
