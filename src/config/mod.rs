//! # Config Module
//!
//! Persisted user settings.
//!
//! Stored as pretty JSON at `<config dir>/media-organizer/settings.json`:
//!
//! ```json
//! {
//!   "processing": { "mode": "by_date", "operation": "copy", "verify": true, "workers": 4 },
//!   "recent": { "sources": ["/Volumes/SD_CARD"], "destinations": ["/Archive"], "max_recent": 10 },
//!   "extra_photo_extensions": ["jxl"],
//!   "extra_video_extensions": []
//! }
//! ```
//!
//! Missing keys take their defaults and unknown keys are ignored.

use crate::core::organize::{OperationMode, OrganizationMode, DEFAULT_WORKERS, MAX_WORKERS};
use crate::core::scanner::ExtensionRegistry;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Application directory name under the platform config dir
pub const APP_DIR: &str = "media-organizer";

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_MAX_RECENT: usize = 10;

/// Defaults for an organize run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingDefaults {
    pub mode: OrganizationMode,
    pub operation: OperationMode,
    pub dry_run: bool,
    pub verify: bool,
    pub ignore_duplicates: bool,
    pub workers: usize,
}

impl Default for ProcessingDefaults {
    fn default() -> Self {
        Self {
            mode: OrganizationMode::ByDate,
            operation: OperationMode::Copy,
            dry_run: false,
            verify: true,
            ignore_duplicates: false,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl ProcessingDefaults {
    /// Worker count within `1..=MAX_WORKERS`
    pub fn workers(&self) -> usize {
        self.workers.clamp(1, MAX_WORKERS)
    }
}

/// Most-recently-used directories, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentDirectories {
    pub sources: Vec<PathBuf>,
    pub destinations: Vec<PathBuf>,
    pub max_recent: usize,
}

impl Default for RecentDirectories {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            destinations: Vec::new(),
            max_recent: DEFAULT_MAX_RECENT,
        }
    }
}

impl RecentDirectories {
    pub fn add_source(&mut self, path: &Path) {
        push_recent(&mut self.sources, path, self.max_recent);
    }

    pub fn add_destination(&mut self, path: &Path) {
        push_recent(&mut self.destinations, path, self.max_recent);
    }
}

fn push_recent(list: &mut Vec<PathBuf>, path: &Path, max: usize) {
    list.retain(|p| p != path);
    list.insert(0, path.to_path_buf());
    list.truncate(max.max(1));
}

/// Everything persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub processing: ProcessingDefaults,
    pub recent: RecentDirectories,
    /// Added to the built-in photo extensions
    pub extra_photo_extensions: Vec<String>,
    /// Added to the built-in video extensions
    pub extra_video_extensions: Vec<String>,
}

impl Settings {
    /// `<config dir>/media-organizer/settings.json`, falling back to the
    /// working directory when the platform has no config dir
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(SETTINGS_FILE)
    }

    /// Read settings. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Like [`Settings::load`], but any problem is logged and defaults used
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable settings");
            Self::default()
        })
    }

    /// Write settings, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, json).map_err(write_error)?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Built-in extension sets plus the configured extras
    pub fn extension_registry(&self) -> ExtensionRegistry {
        ExtensionRegistry::default()
            .with_extra(&self.extra_photo_extensions, &self.extra_video_extensions)
    }

    /// Remember the directories of a run
    pub fn record_run(&mut self, sources: &[PathBuf], destinations: &[PathBuf]) {
        for source in sources.iter().rev() {
            self.recent.add_source(source);
        }
        for destination in destinations.iter().rev() {
            self.recent.add_destination(destination);
        }
    }
}
