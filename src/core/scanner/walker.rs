//! Directory walking implementation using walkdir.

use super::{filter::is_excluded_name, ExtensionRegistry, MediaFile};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Which files a scan keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    /// Only files with a photo or video extension
    MediaOnly,
    /// Every file; unrecognized ones are tagged `Other`
    AllFiles,
}

/// Recursive scanner over a single source root
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    registry: Arc<ExtensionRegistry>,
    scope: ScanScope,
    follow_symlinks: bool,
}

impl DirectoryScanner {
    /// Create a scanner with the given extension sets and scope
    pub fn new(registry: Arc<ExtensionRegistry>, scope: ScanScope) -> Self {
        Self {
            registry,
            scope,
            follow_symlinks: false,
        }
    }

    /// Follow symbolic links while walking
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn scope(&self) -> ScanScope {
        self.scope
    }

    /// Lazily walk `root`, yielding every file that survives the filters.
    ///
    /// Calling this again restarts the walk. Unreadable entries are logged
    /// and skipped.
    pub fn scan<'a>(&'a self, root: &Path) -> impl Iterator<Item = MediaFile> + 'a {
        self.walk(root, |error| warn!(%error, "skipping unreadable entry"))
    }

    /// Walk `root` to completion, reporting progress through `events`
    pub fn scan_with_events(&self, root: &Path, events: &EventSender) -> Vec<MediaFile> {
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let files: Vec<MediaFile> = self
            .walk(root, |error| {
                warn!(%error, "skipping unreadable entry");
                events.send(Event::Scan(ScanEvent::Error {
                    message: error.to_string(),
                }));
            })
            .collect();

        debug!(root = %root.display(), files = files.len(), "scan finished");
        events.send(Event::Scan(ScanEvent::Completed {
            root: root.to_path_buf(),
            total_files: files.len(),
        }));

        files
    }

    fn walk<'a, F>(&'a self, root: &Path, mut on_error: F) -> impl Iterator<Item = MediaFile> + 'a
    where
        F: FnMut(ScanError) + 'a,
    {
        let root_buf = root.to_path_buf();

        WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_excluded_entry(entry))
            .filter_map(move |result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    on_error(walk_error(e, &root_buf));
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| self.classify(entry.into_path()))
    }

    fn classify(&self, path: PathBuf) -> Option<MediaFile> {
        let kind = match self.scope {
            ScanScope::MediaOnly => self.registry.classify(&path)?,
            ScanScope::AllFiles => self.registry.classify_or_other(&path),
        };
        Some(MediaFile::new(path, kind))
    }
}

fn is_excluded_entry(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(is_excluded_name)
        .unwrap_or(false)
}

fn walk_error(e: walkdir::Error, root: &Path) -> ScanError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());

    let kind = e.io_error().map(|io| io.kind());
    if kind == Some(std::io::ErrorKind::PermissionDenied) {
        ScanError::PermissionDenied { path }
    } else if kind == Some(std::io::ErrorKind::NotFound) && e.depth() == 0 {
        ScanError::DirectoryNotFound { path }
    } else {
        ScanError::Walk {
            path,
            source: std::io::Error::other(e.to_string()),
        }
    }
}
