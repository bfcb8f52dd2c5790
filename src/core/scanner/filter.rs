//! Extension sets and system-file filtering for the scanner.

use super::MediaKind;
use std::collections::HashSet;
use std::path::Path;

/// Built-in photo extensions: common raster formats plus camera RAW formats
pub const PHOTO_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tiff", "tif", "heic", "heif", "gif", "bmp", "webp",
    // Canon
    "cr2", "cr3", "crw",
    // Nikon
    "nef", "nrw",
    // Sony
    "arw", "srf", "sr2",
    // Fujifilm
    "raf",
    // Leica / generic
    "dng", "rwl", "raw",
    // Olympus
    "orf",
    // Panasonic
    "rw2",
    // Pentax
    "pef", "ptx",
    // Sigma
    "x3f",
    // Hasselblad
    "3fr", "fff",
    // Phase One
    "iiq",
    // Mamiya
    "mef",
    // Kodak
    "dcr", "kdc",
    // Minolta
    "mrw",
    // Casio
    "bay",
    // Epson
    "erf",
];

/// Built-in video container extensions
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "mts", "m2ts",
];

/// Names of OS artifacts that are never organized (compared case-insensitively)
const SYSTEM_FILES: &[&str] = &["thumbs.db", "desktop.ini", ".ds_store", "__macosx"];

/// Immutable photo/video extension sets, injected into the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRegistry {
    photo: HashSet<String>,
    video: HashSet<String>,
}

impl ExtensionRegistry {
    /// Build a registry from explicit extension lists.
    ///
    /// Extensions are normalized to lowercase without a leading dot.
    pub fn new<P, V, S>(photo: P, video: V) -> Self
    where
        P: IntoIterator<Item = S>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            photo: photo.into_iter().map(|e| normalize(e.as_ref())).collect(),
            video: video.into_iter().map(|e| normalize(e.as_ref())).collect(),
        }
    }

    /// Add user-configured extensions on top of the current sets
    pub fn with_extra(mut self, photo: &[String], video: &[String]) -> Self {
        self.photo.extend(photo.iter().map(|e| normalize(e)));
        self.video.extend(video.iter().map(|e| normalize(e)));
        self
    }

    /// Classify a path by extension. `None` if it is neither photo nor video.
    pub fn classify(&self, path: &Path) -> Option<MediaKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if self.photo.contains(&ext) {
            Some(MediaKind::Photo)
        } else if self.video.contains(&ext) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Classify a path, tagging unrecognized files as `Other`
    pub fn classify_or_other(&self, path: &Path) -> MediaKind {
        self.classify(path).unwrap_or(MediaKind::Other)
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new(PHOTO_EXTENSIONS.iter().copied(), VIDEO_EXTENSIONS.iter().copied())
    }
}

fn normalize(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// True for dotfiles, resource forks and known OS artifacts
pub fn is_excluded_name(name: &str) -> bool {
    if name.starts_with('.') {
        return true;
    }
    let lower = name.to_lowercase();
    SYSTEM_FILES.contains(&lower.as_str())
}
