//! Collision-free target names.
//!
//! `photo.jpg` becomes `photo_1.jpg`, `photo_2.jpg`, ... until a free name
//! is found. Probing is not atomic; concurrent writers into one directory
//! must hold that directory's lock (see [`super::DirectoryLocks`]).

use std::path::{Path, PathBuf};

/// `stem_N.ext` next to `path` (or `stem_N` without an extension)
pub fn numbered_variant(path: &Path, counter: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, counter, ext.to_string_lossy()),
        None => format!("{}_{}", stem, counter),
    };
    path.with_file_name(name)
}

/// Picks the first free name for a desired target path
pub struct UniqueNameAllocator;

impl UniqueNameAllocator {
    /// `desired` if nothing exists there, else the first free numbered variant
    pub fn allocate(desired: &Path) -> PathBuf {
        if !exists(desired) {
            return desired.to_path_buf();
        }

        let mut counter = 1;
        loop {
            let candidate = numbered_variant(desired, counter);
            if !exists(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Dangling symlinks count as taken
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn free_path_is_unchanged() {
        let temp = TempDir::new().unwrap();
        let desired = temp.path().join("photo.jpg");
        assert_eq!(UniqueNameAllocator::allocate(&desired), desired);
    }

    #[test]
    fn taken_path_gets_suffix() {
        let temp = TempDir::new().unwrap();
        let desired = temp.path().join("photo.jpg");
        fs::write(&desired, b"a").unwrap();
        fs::write(temp.path().join("photo_1.jpg"), b"b").unwrap();

        assert_eq!(
            UniqueNameAllocator::allocate(&desired),
            temp.path().join("photo_2.jpg")
        );
    }

    #[test]
    fn numbered_variant_without_extension() {
        assert_eq!(
            numbered_variant(Path::new("/dest/README"), 3),
            PathBuf::from("/dest/README_3")
        );
        assert_eq!(
            numbered_variant(Path::new("/dest/archive.tar.gz"), 1),
            PathBuf::from("/dest/archive.tar_1.gz")
        );
    }

    #[test]
    fn allocations_are_distinct_once_created() {
        let temp = TempDir::new().unwrap();
        let desired = temp.path().join("clip.mp4");
        let mut seen = std::collections::HashSet::new();

        for i in 0..5 {
            let path = UniqueNameAllocator::allocate(&desired);
            fs::write(&path, format!("clip {}", i)).unwrap();
            assert!(seen.insert(path));
        }
        assert!(temp.path().join("clip_4.mp4").exists());
    }
}
