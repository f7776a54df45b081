//! Error types for the teller core

use thiserror::Error;

/// Result type for teller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Teller errors
///
/// The first three variants are business rejections and never accompany a
/// state change. `Persistence` and friends signal infrastructure trouble;
/// see [`Error::is_retryable`].
#[derive(Error, Debug)]
pub enum Error {
    /// Request rejected before any state was touched
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Account does not exist or is not owned by the requesting customer
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Withdrawal or transfer-source debit would drive the balance negative
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Durable state could not be read or written
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a caller may sensibly retry the failed operation
    ///
    /// Infrastructure faults are retryable; business rejections are not and
    /// must be surfaced as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Persistence(_) | Error::Io(_) | Error::Concurrency(_)
        )
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}
