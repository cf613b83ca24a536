//! 64-bit checksum computation for snapshot contents.
//!
//! Every snapshot carries a whole-snapshot checksum computed over its
//! constituent files in a fixed order, and every chunk sent over the wire
//! during replication carries its own checksum. Both use the same CRC-64/XZ
//! algorithm so a receiver can verify a chunk immediately and the
//! accumulated checksum of all chunks against the sender's whole-snapshot
//! value once assembly finishes.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crc::{Crc, CRC_64_XZ};

/// Computes the checksum of a single in-memory buffer.
pub fn checksum_bytes(data: &[u8]) -> u64 {
    let crc = Crc::<u64>::new(&CRC_64_XZ);
    crc.checksum(data)
}

/// Computes the checksum of a file's contents, streaming it through a fixed
/// buffer so the whole file never needs to be resident in memory.
pub fn checksum_file(path: &Path) -> io::Result<u64> {
    let crc = Crc::<u64>::new(&CRC_64_XZ);
    let mut digest = crc.digest();

    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        digest.update(&buf[..n]);
    }
    Ok(digest.finalize())
}

/// Computes a single checksum across a list of files, fed to the digest in
/// the given order. `paths` must already be in the order the caller wants
/// reflected in the result — this function does not sort them. Two calls
/// with the same files in a different order produce different checksums.
pub fn checksum_files_in_order(paths: &[impl AsRef<Path>]) -> io::Result<u64> {
    let crc = Crc::<u64>::new(&CRC_64_XZ);
    let mut digest = crc.digest();

    for path in paths {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            digest.update(&buf[..n]);
        }
    }
    Ok(digest.finalize())
}

/// Formats a checksum the way it appears in log lines and error messages:
/// `crc64:` followed by 16 lowercase hex digits.
pub fn format_checksum(checksum: u64) -> String {
    format!("crc64:{:016x}", checksum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn checksum_bytes_is_deterministic() {
        let data = b"snapshot payload for checksum test";
        assert_eq!(checksum_bytes(data), checksum_bytes(data));
    }

    #[test]
    fn checksum_bytes_detects_changes() {
        assert_ne!(checksum_bytes(b"original"), checksum_bytes(b"modified"));
    }

    #[test]
    fn checksum_file_matches_in_memory_checksum() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        let data = b"file contents for checksum comparison";
        fs::write(&path, data).unwrap();

        assert_eq!(checksum_file(&path).unwrap(), checksum_bytes(data));
    }

    #[test]
    fn checksum_file_spans_multiple_read_buffers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("large.bin");
        let chunk = [0xABu8; 1024];
        let mut data = Vec::new();
        for _ in 0..20 {
            data.extend_from_slice(&chunk);
        }
        fs::write(&path, &data).unwrap();

        assert_eq!(checksum_file(&path).unwrap(), checksum_bytes(&data));
    }

    #[test]
    fn checksum_file_missing_file_is_io_error() {
        let path = Path::new("/nonexistent/path/file.dat");
        assert!(checksum_file(path).is_err());
    }

    #[test]
    fn checksum_files_in_order_is_order_sensitive() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.dat");
        let b = dir.path().join("b.dat");
        fs::write(&a, b"aaa").unwrap();
        fs::write(&b, b"bbb").unwrap();

        let forward = checksum_files_in_order(&[a.clone(), b.clone()]).unwrap();
        let backward = checksum_files_in_order(&[b, a]).unwrap();
        assert_ne!(forward, backward);
    }

    #[test]
    fn checksum_files_in_order_matches_concatenated_bytes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.dat");
        let b = dir.path().join("b.dat");
        fs::write(&a, b"hello ").unwrap();
        fs::write(&b, b"world").unwrap();

        let combined = checksum_files_in_order(&[a, b]).unwrap();
        assert_eq!(combined, checksum_bytes(b"hello world"));
    }

    #[test]
    fn format_checksum_is_fixed_width_hex() {
        assert_eq!(format_checksum(0), "crc64:0000000000000000");
        assert_eq!(format_checksum(0xdead_beef), "crc64:00000000deadbeef");
    }
}
