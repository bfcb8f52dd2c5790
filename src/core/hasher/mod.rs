//! # Hasher Module
//!
//! Content fingerprints for duplicate detection and copy verification.
//!
//! Files are streamed through MD5 in fixed-size blocks, so memory use is
//! flat regardless of file size. MD5 is a duplicate signal here, not a
//! security boundary.
//!
//! ## Example
//! ```rust,ignore
//! use media_organizer::core::hasher::ContentFingerprinter;
//!
//! let hasher = ContentFingerprinter::new();
//! let same = hasher.fingerprint(&a)? == hasher.fingerprint(&b)?;
//! ```

use crate::error::HashError;
use md5::{Digest, Md5};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default read block: 64 KiB
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// MD5 digest of a file's full content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Streams files through MD5
#[derive(Debug, Clone)]
pub struct ContentFingerprinter {
    block_size: usize,
}

impl ContentFingerprinter {
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Override the read block size (minimum 1 byte)
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Hash the whole content of `path`
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let io_error = |source| HashError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_error)?;
        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; self.block_size];

        loop {
            let count = file.read(&mut buffer).map_err(io_error)?;
            if count == 0 {
                break;
            }
            hasher.update(&buffer[..count]);
        }

        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest);
        Ok(Fingerprint(bytes))
    }
}

impl Default for ContentFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn known_digest_for_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.bin");
        fs::write(&path, b"").unwrap();

        let digest = ContentFingerprinter::new().fingerprint(&path).unwrap();
        assert_eq!(digest.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn known_digest_for_short_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();

        let digest = ContentFingerprinter::new().fingerprint(&path).unwrap();
        assert_eq!(digest.to_string(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn block_size_does_not_change_digest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.bin");
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &content).unwrap();

        let large = ContentFingerprinter::new().fingerprint(&path).unwrap();
        let tiny = ContentFingerprinter::new()
            .with_block_size(7)
            .fingerprint(&path)
            .unwrap();
        assert_eq!(large, tiny);
    }

    #[test]
    fn different_content_differs() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two").unwrap();

        let hasher = ContentFingerprinter::new();
        assert_ne!(hasher.fingerprint(&a).unwrap(), hasher.fingerprint(&b).unwrap());
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = ContentFingerprinter::new().fingerprint(Path::new("/nonexistent/file.jpg"));
        assert!(matches!(result, Err(HashError::Io { .. })));
    }
}
