//! Removes directories left empty after a run.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Remove empty directories below `root`, deepest first.
///
/// `root` itself is kept. Failures are logged and skipped. Returns how many
/// directories were removed.
pub fn remove_empty_dirs(root: &Path) -> usize {
    let mut removed = 0;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let is_empty = match fs::read_dir(path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read directory during cleanup");
                continue;
            }
        };
        if !is_empty {
            continue;
        }

        match fs::remove_dir(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed empty directory");
                removed += 1;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not remove empty directory"),
        }
    }

    removed
}
