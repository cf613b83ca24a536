//! Durable filesystem primitives shared by the storage and replication
//! modules: recursive directory copy, explicit fsync of files and their
//! parent directories, and atomic rename-into-place.
//!
//! Every write path in this crate goes through these helpers rather than
//! calling `std::fs` directly, so that the fsync discipline lives in one
//! place instead of being repeated at each call site.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

/// Copies `src` into `dst` recursively, creating `dst` and any needed
/// subdirectories. Does not fsync anything; call [`fsync_dir`] on the
/// top-level destination afterward if durability is required.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dst_path = dst.join(entry.file_name());
        if file_type.is_dir() {
            copy_dir_recursive(&entry.path(), &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &dst_path)?;
        }
        // symlinks and other special files are not part of a snapshot tree.
    }
    Ok(())
}

/// Opens `path` and calls `sync_all`. `path` must be a directory; on most
/// platforms this forces any pending metadata changes (new entries, renames)
/// within it to disk.
pub fn fsync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

/// Recursively fsyncs every regular file under `dir`, then the directories
/// themselves bottom-up, then `dir` last.
pub fn fsync_dir_recursive(dir: &Path) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            fsync_dir_recursive(&entry.path())?;
        } else if file_type.is_file() {
            let file = File::open(entry.path())?;
            file.sync_all()?;
        }
    }
    fsync_dir(dir)
}

/// Removes `path` (file or directory tree) if it exists. A missing path is
/// not an error.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Writes `bytes` to a temporary sibling of `path` and renames it into
/// place, fsyncing the file before the rename and the parent directory
/// after. A reader can never observe a partially written file at `path`.
pub fn write_durable(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;
    let tmp_name = format!(
        ".{}.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("write-durable")
    );
    let tmp_path = parent.join(tmp_name);

    {
        let mut file = File::create(&tmp_path)?;
        use std::io::Write;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    fsync_dir(parent)?;
    Ok(())
}
