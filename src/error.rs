//! Error types for the TTL store.
//!
//! Every failure the store can report is an expected, recoverable condition.
//! Errors are returned to the immediate caller; the worker never panics or
//! logs on a bad request.

use std::io;

use thiserror::Error;

/// The main error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// `create` found a live entry already occupying the key.
    #[error("key already exists: '{0}'")]
    KeyExists(String),

    /// No live entry exists for the key. Expired entries count as absent.
    #[error("key not found: '{0}'")]
    KeyNotFound(String),

    /// The TTL specification could not be parsed.
    #[error("invalid TTL value: '{0}'")]
    InvalidTtl(String),

    /// The store is draining or stopped and accepts no new requests.
    #[error("store is shutting down")]
    ShuttingDown,

    /// The command received was invalid or malformed.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Failed to decode a protocol line.
    #[error("parse error: {0}")]
    ParseError(String),

    /// An I/O error occurred on a connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::KeyExists("foo".to_string());
        assert_eq!(err.to_string(), "key already exists: 'foo'");

        let err = StoreError::KeyNotFound("foo".to_string());
        assert_eq!(err.to_string(), "key not found: 'foo'");

        let err = StoreError::InvalidTtl("not-a-duration".to_string());
        assert_eq!(err.to_string(), "invalid TTL value: 'not-a-duration'");

        assert_eq!(
            StoreError::ShuttingDown.to_string(),
            "store is shutting down"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
