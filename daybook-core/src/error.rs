//! Error types for daybook-core

use thiserror::Error;

/// Everything that can go wrong inside daybook-core
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite failure, including rows whose columns cannot be decoded
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable or invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// No entry with this id belongs to the requesting owner
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// Structurally invalid input handed to the stats engine
    #[error("computation error: {0}")]
    Computation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
