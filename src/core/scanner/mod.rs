//! # Scanner Module
//!
//! Discovers media files in source directories.
//!
//! ## Classification
//! Every file is tagged once, from its extension, as a photo, a video or
//! "other". The extension sets live in an [`ExtensionRegistry`] that is
//! injected into the scanner so tests can substitute minimal sets.
//!
//! ## Excluded Files
//! - Dotfiles and macOS resource forks (`._*`)
//! - `Thumbs.db`, `Desktop.ini`, `.DS_Store`
//! - Anything under a `__MACOSX` or hidden directory
//!
//! ## Example
//! ```rust,ignore
//! use media_organizer::core::scanner::{DirectoryScanner, ExtensionRegistry, ScanScope};
//!
//! let scanner = DirectoryScanner::new(Arc::new(ExtensionRegistry::default()), ScanScope::MediaOnly);
//! for file in scanner.scan(Path::new("/Volumes/SD_CARD")) {
//!     println!("{:?} {}", file.kind, file.path.display());
//! }
//! ```

mod filter;
mod walker;

pub use filter::{is_excluded_name, ExtensionRegistry, PHOTO_EXTENSIONS, VIDEO_EXTENSIONS};
pub use walker::{DirectoryScanner, ScanScope};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file discovered in a source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path to the file
    pub path: PathBuf,
    /// Kind derived from the extension at scan time
    pub kind: MediaKind,
}

impl MediaFile {
    pub fn new(path: PathBuf, kind: MediaKind) -> Self {
        Self { path, kind }
    }

    /// Final path component, lossily converted for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Capture kind of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Other,
}

impl MediaKind {
    /// Top-level folder name used in the destination tree
    pub fn type_root(&self) -> &'static str {
        match self {
            MediaKind::Photo => "Picture",
            MediaKind::Video => "Video",
            MediaKind::Other => "Other",
        }
    }

    /// Whether embedded metadata is worth looking up
    pub fn has_capture_metadata(&self) -> bool {
        !matches!(self, MediaKind::Other)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}
