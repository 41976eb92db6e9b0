//! Error types for the TTL store.
//!
//! The engine reports three kinds of failure to its callers:
//!
//! - [`StoreError::BadRequest`]: the arguments were unusable (empty key or
//!   value, unparsable TTL, empty key list). Nothing was mutated.
//! - [`StoreError::NotFound`]: a delete named a key that is not stored.
//! - [`StoreError::Storage`]: the snapshot could not be written. Any
//!   in-memory mutation that preceded the write is kept.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed arguments
    #[error("{0}")]
    BadRequest(String),

    /// The key is not present in the store
    #[error("key not found")]
    NotFound,

    /// The snapshot write failed; the in-memory change was not rolled back
    #[error("storage failure: {0}")]
    Storage(#[from] SnapshotError),
}

impl StoreError {
    /// Shorthand for building a [`StoreError::BadRequest`].
    pub fn bad_request(msg: impl Into<String>) -> Self {
        StoreError::BadRequest(msg.into())
    }

    pub fn is_bad_request(&self) -> bool {
        matches!(self, StoreError::BadRequest(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

/// Errors raised while reading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No snapshot exists yet (first start)
    #[error("no snapshot at {}", path.display())]
    Missing { path: PathBuf },

    /// Reading, writing or renaming the file failed
    #[error("snapshot I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The in-memory map could not be serialized
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The file exists but does not contain a valid snapshot
    #[error("failed to decode snapshot {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SnapshotError {
    /// Returns true when the snapshot simply does not exist yet.
    pub fn is_missing(&self) -> bool {
        matches!(self, SnapshotError::Missing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(StoreError::bad_request("missing key").is_bad_request());
        assert!(StoreError::NotFound.is_not_found());

        let err: StoreError = SnapshotError::Missing {
            path: PathBuf::from("store.json"),
        }
        .into();
        assert!(err.is_storage());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::bad_request("missing key or value").to_string(),
            "missing key or value"
        );
        assert_eq!(StoreError::NotFound.to_string(), "key not found");

        let err = SnapshotError::Missing {
            path: PathBuf::from("store.json"),
        };
        assert!(err.is_missing());
        assert_eq!(err.to_string(), "no snapshot at store.json");
    }
}
