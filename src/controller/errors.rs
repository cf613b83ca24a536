//! Error type for [`super::SnapshotController`] operations.
//!
//! Generic over the wrapped database's own error type so that a precondition
//! violation or fatal recovery failure can still be reported with a stable
//! code and severity, independent of which `Database` implementation is
//! plugged in.

use std::fmt;

use crate::replication::ReplicationError;
use crate::storage::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed; caller may retry.
    Error,
    /// Unrecoverable; the caller must escalate, no further recovery is
    /// possible without operator action.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug)]
pub enum ControllerError<E> {
    /// The on-disk snapshot layer rejected an operation.
    Storage(StorageError),
    /// The replication layer rejected an operation.
    Replication(ReplicationError),
    /// The underlying database returned an error while opening, dumping,
    /// or closing.
    Db(E),
    /// A precondition was violated (e.g. taking a snapshot while the
    /// database is closed, or committing a nonexistent pending snapshot).
    Precondition(String),
    /// Recovery found committed snapshots but none could be opened.
    RecoveryExhausted(String),
}

impl<E: std::error::Error> ControllerError<E> {
    pub fn code(&self) -> &'static str {
        match self {
            ControllerError::Storage(_) => "CONTROLLER_STORAGE",
            ControllerError::Replication(_) => "CONTROLLER_REPLICATION",
            ControllerError::Db(_) => "CONTROLLER_DB",
            ControllerError::Precondition(_) => "CONTROLLER_PRECONDITION",
            ControllerError::RecoveryExhausted(_) => "CONTROLLER_RECOVERY_EXHAUSTED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ControllerError::RecoveryExhausted(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl<E> From<StorageError> for ControllerError<E> {
    fn from(e: StorageError) -> Self {
        ControllerError::Storage(e)
    }
}

impl<E> From<ReplicationError> for ControllerError<E> {
    fn from(e: ReplicationError) -> Self {
        ControllerError::Replication(e)
    }
}

impl<E: fmt::Display> fmt::Display for ControllerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Storage(e) => write!(f, "[ERROR] CONTROLLER_STORAGE: {}", e),
            ControllerError::Replication(e) => write!(f, "[ERROR] CONTROLLER_REPLICATION: {}", e),
            ControllerError::Db(e) => write!(f, "[ERROR] CONTROLLER_DB: {}", e),
            ControllerError::Precondition(msg) => {
                write!(f, "[ERROR] CONTROLLER_PRECONDITION: {}", msg)
            }
            ControllerError::RecoveryExhausted(msg) => {
                write!(f, "[FATAL] CONTROLLER_RECOVERY_EXHAUSTED: {}", msg)
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for ControllerError<E> {}

pub type ControllerResult<T, E> = Result<T, ControllerError<E>>;
