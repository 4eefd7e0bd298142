//! Custom error types for the common library
//!
//! This module defines the error types raised by the key-value backing
//! stores that hold persisted session records.

use thiserror::Error;

/// Custom error type for backing store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error occurred while reading or writing the underlying medium
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error occurred while encoding or decoding a stored record
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key cannot be mapped onto the backing medium
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Configuration error
    #[error("Storage configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;
