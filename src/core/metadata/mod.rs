//! # Metadata Module
//!
//! Best-effort capture date and device label for a media file.
//!
//! ## Providers
//! - [`EmbeddedMetadataProvider`]: EXIF for photos, `ffprobe` for videos,
//!   then filename heuristics
//! - [`FallbackMetadataProvider`]: modification time and `"Unknown"`
//! - [`StaticMetadataProvider`]: fixed answers, for tests and previews
//!
//! Every provider answers for every file. Failures degrade to the file's
//! modification time and [`UNKNOWN_DEVICE`]; nothing here returns an error.

mod device;
mod exif;
mod video;

pub use device::{
    device_from_filename, device_from_handler, device_from_model, normalize_make, UNKNOWN_DEVICE,
};
pub use exif::{parse_exif_datetime, read_exif, ExifSummary};
pub use video::{parse_probe_output, parse_video_datetime, FfprobeReader, VideoMetadata};

use crate::core::scanner::MediaKind;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Capture date and device for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureInfo {
    /// Embedded capture time, else modification time
    pub timestamp: NaiveDateTime,
    /// Normalized device label, never empty
    pub device_label: String,
}

impl CaptureInfo {
    /// Build a capture info, replacing a blank label with [`UNKNOWN_DEVICE`]
    pub fn new(timestamp: NaiveDateTime, device_label: impl Into<String>) -> Self {
        let label = device_label.into();
        let device_label = if label.trim().is_empty() {
            UNKNOWN_DEVICE.to_string()
        } else {
            label
        };
        Self {
            timestamp,
            device_label,
        }
    }

    /// Modification time and [`UNKNOWN_DEVICE`]
    pub fn fallback(path: &Path) -> Self {
        Self::new(modified_time(path), UNKNOWN_DEVICE)
    }
}

/// Source of capture metadata.
///
/// Implementations never fail: anything unreadable becomes the file's
/// modification time and [`UNKNOWN_DEVICE`].
pub trait MetadataProvider: Send + Sync {
    /// Best-effort capture time
    fn capture_timestamp(&self, path: &Path, kind: MediaKind) -> NaiveDateTime;

    /// Best-effort device label
    fn device_label(&self, path: &Path, kind: MediaKind) -> String;

    /// Both at once. Providers that read the file once for both should
    /// override this.
    fn capture_info(&self, path: &Path, kind: MediaKind) -> CaptureInfo {
        CaptureInfo::new(
            self.capture_timestamp(path, kind),
            self.device_label(path, kind),
        )
    }
}

/// File modification time in local wall-clock, or now if unreadable
pub fn modified_time(path: &Path) -> NaiveDateTime {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(|mtime| DateTime::<Local>::from(mtime).naive_local())
        .unwrap_or_else(|_| Local::now().naive_local())
}

/// Modification time and [`UNKNOWN_DEVICE`] for everything
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMetadataProvider;

impl MetadataProvider for FallbackMetadataProvider {
    fn capture_timestamp(&self, path: &Path, _kind: MediaKind) -> NaiveDateTime {
        modified_time(path)
    }

    fn device_label(&self, _path: &Path, _kind: MediaKind) -> String {
        UNKNOWN_DEVICE.to_string()
    }
}

/// The same answer for every file
#[derive(Debug, Clone)]
pub struct StaticMetadataProvider {
    timestamp: NaiveDateTime,
    device_label: String,
}

impl StaticMetadataProvider {
    pub fn new(timestamp: NaiveDateTime, device_label: impl Into<String>) -> Self {
        Self {
            timestamp,
            device_label: device_label.into(),
        }
    }
}

impl MetadataProvider for StaticMetadataProvider {
    fn capture_timestamp(&self, _path: &Path, _kind: MediaKind) -> NaiveDateTime {
        self.timestamp
    }

    fn device_label(&self, _path: &Path, _kind: MediaKind) -> String {
        self.device_label.clone()
    }
}

/// Reads EXIF from photos and asks `ffprobe` about videos.
///
/// Device lookup order: embedded make, model hints, filename patterns,
/// [`UNKNOWN_DEVICE`].
#[derive(Debug, Clone, Default)]
pub struct EmbeddedMetadataProvider {
    ffprobe: Option<FfprobeReader>,
}

impl EmbeddedMetadataProvider {
    /// EXIF only; videos use filename heuristics and modification time
    pub fn new() -> Self {
        Self { ffprobe: None }
    }

    /// Use `ffprobe` for videos if it runs on this machine
    pub fn detect() -> Self {
        let reader = FfprobeReader::new();
        if reader.is_available() {
            debug!("ffprobe found, video metadata enabled");
            Self::with_ffprobe(reader)
        } else {
            debug!("ffprobe not found, videos fall back to file times");
            Self::new()
        }
    }

    pub fn with_ffprobe(reader: FfprobeReader) -> Self {
        Self {
            ffprobe: Some(reader),
        }
    }

    pub fn has_video_support(&self) -> bool {
        self.ffprobe.is_some()
    }

    fn embedded(&self, path: &Path, kind: MediaKind) -> (Option<NaiveDateTime>, Option<String>) {
        match kind {
            MediaKind::Photo => {
                let exif = read_exif(path);
                let device = exif
                    .make
                    .as_deref()
                    .and_then(normalize_make)
                    .or_else(|| exif.model.as_deref().and_then(device_from_model));
                (exif.date_taken, device)
            }
            MediaKind::Video => match self.ffprobe.as_ref().and_then(|r| r.probe(path)) {
                Some(video) => (video.created, video.device),
                None => (None, None),
            },
            MediaKind::Other => (None, None),
        }
    }
}

impl MetadataProvider for EmbeddedMetadataProvider {
    fn capture_timestamp(&self, path: &Path, kind: MediaKind) -> NaiveDateTime {
        self.capture_info(path, kind).timestamp
    }

    fn device_label(&self, path: &Path, kind: MediaKind) -> String {
        self.capture_info(path, kind).device_label
    }

    fn capture_info(&self, path: &Path, kind: MediaKind) -> CaptureInfo {
        if !kind.has_capture_metadata() {
            return CaptureInfo::fallback(path);
        }

        let (taken, device) = self.embedded(path, kind);
        let timestamp = taken.unwrap_or_else(|| modified_time(path));
        let device = device
            .or_else(|| device_from_filename(path))
            .unwrap_or_else(|| UNKNOWN_DEVICE.to_string());

        CaptureInfo::new(timestamp, device)
    }
}
