//! Unified error types for the squirrel archive.
//!
//! Every variant renders with a stable prefix so callers on the other side of
//! the MCP transport can match on the error class.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error type for the archive engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty tab list).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A referenced row does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Schema creation or migration failed to apply.
    #[error("MIGRATION_FAILED: {0}")]
    MigrationFailed(String),

    /// The archive connection failed to open or has been closed.
    #[error("NOT_READY: {0}")]
    NotReady(String),

    /// A tab URL could not be parsed.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A query asked for a column the result set does not have.
    #[error("UNKNOWN_COLUMN: {0}")]
    UnknownColumn(String),

    /// A column value could not be converted to the requested type.
    #[error("DECODE_ERROR: {0}")]
    Decode(String),

    /// Favicon lookup failed.
    #[error("FAVICON_ERROR: {0}")]
    Favicon(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32602, msg.clone()),
            Error::NotFound(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::UnknownColumn(msg) => (-32002, msg.clone()),
            Error::Decode(msg) => (-32002, msg.clone()),
            Error::NotReady(msg) => (-32003, msg.clone()),
            Error::Favicon(msg) => (-32004, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
