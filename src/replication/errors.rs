//! Error type for replication operations.

use std::fmt;

use crate::storage::StorageError;

/// Severity for replication errors. Corruption is handled by discarding the
/// affected artifact, not by raising — these errors cover the transient
/// I/O cases that leave pending state in place for a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug)]
pub enum ReplicationError {
    /// A filesystem read/write failed while sending or assembling chunks.
    Io(std::io::Error),
    /// The underlying storage layer rejected a directory operation.
    Storage(StorageError),
}

impl ReplicationError {
    pub fn code(&self) -> &'static str {
        match self {
            ReplicationError::Io(_) => "REPLICATION_IO",
            ReplicationError::Storage(_) => "REPLICATION_STORAGE",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl From<std::io::Error> for ReplicationError {
    fn from(e: std::io::Error) -> Self {
        ReplicationError::Io(e)
    }
}

impl From<StorageError> for ReplicationError {
    fn from(e: StorageError) -> Self {
        ReplicationError::Storage(e)
    }
}

impl fmt::Display for ReplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationError::Io(e) => write!(f, "[{}] {}: {}", self.severity(), self.code(), e),
            ReplicationError::Storage(e) => {
                write!(f, "[{}] {}: {}", self.severity(), self.code(), e)
            }
        }
    }
}

impl std::error::Error for ReplicationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplicationError::Io(e) => Some(e),
            ReplicationError::Storage(e) => Some(e),
        }
    }
}

pub type ReplicationResult<T> = Result<T, ReplicationError>;
