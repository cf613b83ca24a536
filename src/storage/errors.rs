//! Error type for [`super::SnapshotStorage`] operations.

use std::fmt;
use std::io;

/// Severity levels for storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed; caller may retry or fall back.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// A filesystem operation (copy, rename, remove) failed.
    Io,
    /// The requested snapshot id is not a valid natural-number string.
    MalformedId,
}

impl StorageErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::Io => "SNAPSHOT_STORAGE_IO",
            StorageErrorCode::MalformedId => "SNAPSHOT_STORAGE_MALFORMED_ID",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned by [`super::SnapshotStorage`] operations.
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl StorageError {
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::Io,
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn malformed_id(id: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::MalformedId,
            message: format!("not a valid snapshot id: {}", id.into()),
            source: None,
        }
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable_strings() {
        assert_eq!(StorageErrorCode::Io.code(), "SNAPSHOT_STORAGE_IO");
        assert_eq!(
            StorageErrorCode::MalformedId.code(),
            "SNAPSHOT_STORAGE_MALFORMED_ID"
        );
    }

    #[test]
    fn malformed_id_message_contains_the_id() {
        let err = StorageError::malformed_id("../etc");
        assert!(err.message().contains("../etc"));
    }
}
