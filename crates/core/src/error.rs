//! Unified error types for the umbra cache engine.
//!
//! Errors carry a stable uppercase prefix so host log filters can match on
//! them without parsing the message body.

use crate::config::ConfigError;
use tokio_rusqlite::rusqlite;

/// Unified error type shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A URL could not be parsed or resolved against the engine origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// The underlying storage refused a write because it is full.
    ///
    /// Callers treat this as non-fatal: the in-flight response is still
    /// returned to the requester, only the cache write is dropped.
    #[error("QUOTA_EXCEEDED: {0}")]
    QuotaExceeded(String),

    /// Outbound fetch failed at the transport level (refused, timed out,
    /// too many redirects).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Response body exceeded the configured size cap.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Configuration failed to load or validate.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
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
        if let rusqlite::Error::SqliteFailure(code, ref msg) = err
            && code.code == rusqlite::ErrorCode::DiskFull
        {
            return Error::QuotaExceeded(msg.clone().unwrap_or_else(|| "database or disk is full".into()));
        }
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
