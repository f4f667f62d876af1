// src/error.rs

//! Error types shared by the catalog, mirror store and upstream clients

use thiserror::Error;

/// Library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid package name: {0}")]
    InvalidName(String),

    #[error("Upstream lookup failed: {0}")]
    DownloadError(String),

    #[error("Clone failed: {0}")]
    CloneError(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

/// Result alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
