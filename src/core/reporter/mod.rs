//! # Reporter Module
//!
//! Summarizes what a source tree holds before anything is organized.
//!
//! ## Figures
//! - Photo, video and other file counts
//! - Byte totals per kind
//! - Space a run needs, against what each destination disk has free
//!
//! The scanner's filters apply, so hidden and system files never count.

mod space;

pub use space::{bytes_per_destination, estimate_required_space, DiskSpace, SpaceCheck};

use crate::core::scanner::{DirectoryScanner, MediaKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Count and size for one kind of file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindTotals {
    pub files: usize,
    pub bytes: u64,
}

impl KindTotals {
    fn add(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }
}

/// What a source root contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub root: PathBuf,
    pub photos: KindTotals,
    pub videos: KindTotals,
    pub other: KindTotals,
}

impl SourceSummary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            photos: KindTotals::default(),
            videos: KindTotals::default(),
            other: KindTotals::default(),
        }
    }

    /// Walk `root` with `scanner` and total up what it yields
    pub fn collect(scanner: &DirectoryScanner, root: &Path) -> Self {
        let mut summary = Self::new(root);
        for file in scanner.scan(root) {
            let bytes = match fs::metadata(&file.path) {
                Ok(meta) => meta.len(),
                Err(e) => {
                    debug!(path = %file.path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            summary.add(file.kind, bytes);
        }
        summary
    }

    pub fn add(&mut self, kind: MediaKind, bytes: u64) {
        match kind {
            MediaKind::Photo => self.photos.add(bytes),
            MediaKind::Video => self.videos.add(bytes),
            MediaKind::Other => self.other.add(bytes),
        }
    }

    /// Photos and videos
    pub fn media(&self) -> KindTotals {
        KindTotals {
            files: self.photos.files + self.videos.files,
            bytes: self.photos.bytes + self.videos.bytes,
        }
    }

    pub fn total(&self) -> KindTotals {
        let media = self.media();
        KindTotals {
            files: media.files + self.other.files,
            bytes: media.bytes + self.other.bytes,
        }
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::{ExtensionRegistry, ScanScope};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), vec![0u8; 100]).unwrap();
        fs::create_dir(temp.path().join("clips")).unwrap();
        fs::write(temp.path().join("clips/b.mp4"), vec![0u8; 300]).unwrap();
        fs::write(temp.path().join("notes.txt"), vec![0u8; 7]).unwrap();
        fs::write(temp.path().join(".DS_Store"), vec![0u8; 50]).unwrap();
        temp
    }

    #[test]
    fn media_only_summary() {
        let temp = fixture();
        let scanner = DirectoryScanner::new(Arc::new(ExtensionRegistry::default()), ScanScope::MediaOnly);

        let summary = SourceSummary::collect(&scanner, temp.path());
        assert_eq!(summary.photos, KindTotals { files: 1, bytes: 100 });
        assert_eq!(summary.videos, KindTotals { files: 1, bytes: 300 });
        assert_eq!(summary.other, KindTotals::default());
        assert_eq!(summary.media().bytes, 400);
    }

    #[test]
    fn all_files_summary_counts_other() {
        let temp = fixture();
        let scanner = DirectoryScanner::new(Arc::new(ExtensionRegistry::default()), ScanScope::AllFiles);

        let summary = SourceSummary::collect(&scanner, temp.path());
        assert_eq!(summary.other, KindTotals { files: 1, bytes: 7 });
        assert_eq!(summary.total(), KindTotals { files: 3, bytes: 407 });
    }

    #[test]
    fn format_bytes_handles_all_sizes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.0 GB");
        assert_eq!(format_bytes(5_000_000), "4.8 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 * 1024), "3.0 TB");
    }
}
