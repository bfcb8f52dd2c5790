//! Maps a file to its relative destination directory.
//!
//! Pure: the same inputs always give the same path and nothing touches the
//! filesystem. Device labels are used verbatim, so callers sanitize them
//! first.

use super::types::OrganizationMode;
use crate::core::metadata::CaptureInfo;
use crate::core::scanner::MediaKind;
use std::path::{Path, PathBuf};

/// Folder for files without an extension in extension mode
pub const NO_EXTENSION: &str = "NO_EXTENSION";

/// Segment that separates duplicates from originals
pub const DUPLICATE_DIR: &str = "duplicate";

/// Computes destination directories
pub struct PathClassifier;

impl PathClassifier {
    /// Relative directory for `file` under a destination root.
    ///
    /// Duplicates get the same sub-structure below `{TypeRoot}/duplicate`,
    /// or below `duplicate` in extension mode.
    pub fn classify(
        file: &Path,
        kind: MediaKind,
        info: &CaptureInfo,
        mode: OrganizationMode,
        is_duplicate: bool,
    ) -> PathBuf {
        let mut dir = PathBuf::new();

        if mode == OrganizationMode::ByExtension {
            if is_duplicate {
                dir.push(DUPLICATE_DIR);
            }
            dir.push(Self::extension_folder(file));
            return dir;
        }

        dir.push(kind.type_root());
        if is_duplicate {
            dir.push(DUPLICATE_DIR);
        }

        let date = info.timestamp.format("%Y-%m-%d").to_string();
        match mode {
            OrganizationMode::ByDate => {
                dir.push(info.timestamp.format("%Y").to_string());
                dir.push(date);
            }
            OrganizationMode::ByDevice => {
                dir.push(&info.device_label);
            }
            OrganizationMode::ByDateAndDevice => {
                dir.push(date);
                dir.push(&info.device_label);
            }
            OrganizationMode::ByExtension => {}
        }
        dir
    }

    /// Uppercased extension, or [`NO_EXTENSION`]
    pub fn extension_folder(file: &Path) -> String {
        file.extension()
            .map(|ext| ext.to_string_lossy().to_uppercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| NO_EXTENSION.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn info(y: i32, m: u32, d: u32, device: &str) -> CaptureInfo {
        let ts = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        CaptureInfo::new(ts, device)
    }

    fn classify(name: &str, kind: MediaKind, mode: OrganizationMode, dup: bool) -> PathBuf {
        PathClassifier::classify(Path::new(name), kind, &info(2024, 3, 15, "Canon"), mode, dup)
    }

    #[test]
    fn by_date_layout() {
        assert_eq!(
            classify("photo.jpg", MediaKind::Photo, OrganizationMode::ByDate, false),
            PathBuf::from("Picture/2024/2024-03-15")
        );
        assert_eq!(
            classify("clip.mp4", MediaKind::Video, OrganizationMode::ByDate, false),
            PathBuf::from("Video/2024/2024-03-15")
        );
    }

    #[test]
    fn by_device_layout() {
        assert_eq!(
            classify("photo.jpg", MediaKind::Photo, OrganizationMode::ByDevice, false),
            PathBuf::from("Picture/Canon")
        );
    }

    #[test]
    fn by_date_and_device_layout() {
        assert_eq!(
            classify("photo.jpg", MediaKind::Photo, OrganizationMode::ByDateAndDevice, false),
            PathBuf::from("Picture/2024-03-15/Canon")
        );
    }

    #[test]
    fn by_extension_ignores_kind() {
        assert_eq!(
            classify("photo.jpg", MediaKind::Photo, OrganizationMode::ByExtension, false),
            PathBuf::from("JPG")
        );
        assert_eq!(
            classify("notes.Txt", MediaKind::Other, OrganizationMode::ByExtension, false),
            PathBuf::from("TXT")
        );
        assert_eq!(
            classify("Makefile", MediaKind::Other, OrganizationMode::ByExtension, false),
            PathBuf::from(NO_EXTENSION)
        );
    }

    #[test]
    fn duplicates_keep_sub_structure() {
        assert_eq!(
            classify("a.jpg", MediaKind::Photo, OrganizationMode::ByDate, true),
            PathBuf::from("Picture/duplicate/2024/2024-03-15")
        );
        assert_eq!(
            classify("a.mov", MediaKind::Video, OrganizationMode::ByDateAndDevice, true),
            PathBuf::from("Video/duplicate/2024-03-15/Canon")
        );
        assert_eq!(
            classify("a.jpg", MediaKind::Photo, OrganizationMode::ByExtension, true),
            PathBuf::from("duplicate/JPG")
        );
    }

    #[test]
    fn years_are_zero_padded() {
        let early = info(987, 1, 2, "Unknown");
        let dir = PathClassifier::classify(
            Path::new("old.jpg"),
            MediaKind::Photo,
            &early,
            OrganizationMode::ByDate,
            false,
        );
        assert_eq!(dir, PathBuf::from("Picture/0987/0987-01-02"));
    }

    #[test]
    fn classification_is_deterministic() {
        for mode in [
            OrganizationMode::ByDate,
            OrganizationMode::ByDevice,
            OrganizationMode::ByDateAndDevice,
            OrganizationMode::ByExtension,
        ] {
            for dup in [false, true] {
                let first = classify("IMG_0001.HEIC", MediaKind::Photo, mode, dup);
                let second = classify("IMG_0001.HEIC", MediaKind::Photo, mode, dup);
                assert_eq!(first, second);
            }
        }
    }
}
