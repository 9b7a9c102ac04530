//! Store error types.
//!
//! None of these leave the task collection half-updated: storage failures are
//! reported through [`SaveStatus`](crate::SaveStatus), sync failures reject
//! the whole import, and assist failures never reach the store.

use tally_core::NormalizeError;
use thiserror::Error;

/// Failure of the durable storage slot.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O failed for '{key}': {source}")]
    Io {
        /// Storage key being accessed.
        key: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The key cannot name a storage slot (empty or contains a path separator).
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),

    /// Storage refused the operation (quota exceeded, disabled).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The collection could not be encoded for storage.
    #[error("failed to encode tasks: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a sync code was rejected.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Not valid base64.
    #[error("sync code is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes (or unescaped text) are not UTF-8.
    #[error("sync code does not contain UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// A `%` escape is truncated or not followed by two hex digits.
    #[error("sync code has a corrupt escape sequence at byte {position}")]
    Escape {
        /// Byte offset of the offending `%`.
        position: usize,
    },

    /// The unescaped payload is not JSON.
    #[error("sync code payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is JSON but not a task collection.
    #[error(transparent)]
    NotACollection(#[from] NormalizeError),
}

/// Rejected store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Assignee is not in the configured participant set.
    #[error("'{name}' is not a participant")]
    UnknownAssignee {
        /// The rejected name.
        name: String,
    },

    /// Import rejected; the store is unchanged.
    #[error("import rejected: {0}")]
    Sync(#[from] SyncError),
}

/// Failure of an external assist collaborator.
#[derive(Debug, Error)]
pub enum AssistError {
    /// The service could not be reached or returned an error.
    #[error("assist service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something unusable.
    #[error("assist service returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_assignee_display() {
        let err = StoreError::UnknownAssignee { name: "Zed".into() };
        assert_eq!(err.to_string(), "'Zed' is not a participant");
    }

    #[test]
    fn not_a_collection_is_transparent() {
        let err = SyncError::from(NormalizeError::NotACollection { found: "object" });
        assert_eq!(
            err.to_string(),
            "expected a task collection (JSON array), found object"
        );
    }

    #[test]
    fn store_error_wraps_sync() {
        let err = StoreError::from(SyncError::Escape { position: 3 });
        assert_eq!(
            err.to_string(),
            "import rejected: sync code has a corrupt escape sequence at byte 3"
        );
    }

    #[test]
    fn storage_io_display() {
        let err = StorageError::Io {
            key: "tasks".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("'tasks'"));
        assert!(err.to_string().contains("denied"));
    }
}
