//! Error types for gazette storage operations

use thiserror::Error;

/// Object store adapter errors.
///
/// A failed adapter call surfaces here and propagates unchanged; this
/// layer performs no retries and attaches no extra context. A missing key
/// is NOT an error - reads report absence as `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObjectStoreError {
    #[error("object store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Stored bytes failed to deserialize into the expected shape.
    /// Data corruption or schema drift, never silently coerced.
    #[error("malformed record at {key}: {reason}")]
    Malformed { key: String, reason: String },

    #[error("object store error: {0}")]
    Store(#[from] ObjectStoreError),
}

/// Result type alias for object store adapter calls.
pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// TESTS
// =============================================================================
