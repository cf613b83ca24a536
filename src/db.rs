//! The narrow capability the snapshot core requires from the embedded
//! key-value store it sits on top of. The core never inspects file formats
//! or interprets the bytes inside a snapshot directory — it only opens,
//! dumps, and closes through this trait.

use std::path::Path;

/// A scoped handle to an open database rooted at one directory.
///
/// Implemented by the real embedded store in production and by
/// fault-injecting doubles in tests (see [`crate::testing`]), so the
/// corruption and recovery scenarios this crate is tested against never
/// need a real storage engine.
pub trait Database: Sized {
    type Handle;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Opens a database rooted at `directory`, creating it if empty.
    fn open(directory: &Path) -> Result<Self::Handle, Self::Error>;

    /// Writes a consistent, self-contained copy of `handle`'s current state
    /// into `target_directory`, which must be empty. The copy is only
    /// restartable via a fresh call to `open` on `target_directory`.
    fn create_snapshot(handle: &Self::Handle, target_directory: &Path) -> Result<(), Self::Error>;

    /// Releases file handles and background threads owned by `handle`.
    fn close(handle: Self::Handle) -> Result<(), Self::Error>;
}
