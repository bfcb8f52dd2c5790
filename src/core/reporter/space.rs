//! Free-space pre-flight for destinations.

use super::SourceSummary;
use crate::core::organize::OperationMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::debug;

/// Bytes one destination receives: everything the summaries counted.
///
/// Collect the summaries with the scan scope the run will use, so
/// non-media files only count in extension mode.
pub fn bytes_per_destination(summaries: &[SourceSummary]) -> u64 {
    summaries.iter().map(|s| s.total().bytes).sum()
}

/// Bytes a run needs across all destinations.
///
/// Copies land once per destination; a move lands once.
pub fn estimate_required_space(
    summaries: &[SourceSummary],
    destinations: usize,
    operation: OperationMode,
) -> u64 {
    let bytes = bytes_per_destination(summaries);
    match operation {
        OperationMode::Copy => bytes.saturating_mul(destinations as u64),
        OperationMode::Move => bytes,
    }
}

/// Space needed and available on one disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceCheck {
    /// Mount point, or the destination itself when its disk is unknown
    pub mount: PathBuf,
    /// Destinations on this disk
    pub destinations: Vec<PathBuf>,
    pub required: u64,
    /// `None` when free space could not be determined
    pub available: Option<u64>,
}

impl SpaceCheck {
    /// Unknown free space counts as enough
    pub fn is_sufficient(&self) -> bool {
        self.available.map_or(true, |available| available >= self.required)
    }

    pub fn shortfall(&self) -> u64 {
        self.available
            .map_or(0, |available| self.required.saturating_sub(available))
    }
}

/// Snapshot of mounted disks and their free space
#[derive(Debug, Clone, Default)]
pub struct DiskSpace {
    mounts: Vec<(PathBuf, u64)>,
}

impl DiskSpace {
    /// Read the mounted disks of this machine
    pub fn from_system() -> Self {
        let disks = Disks::new_with_refreshed_list();
        let mounts = disks
            .list()
            .iter()
            .map(|disk| (disk.mount_point().to_path_buf(), disk.available_space()))
            .collect::<Vec<_>>();
        debug!(disks = mounts.len(), "read disk list");
        Self { mounts }
    }

    /// Use a fixed list of `(mount point, free bytes)`
    pub fn from_mounts(mounts: Vec<(PathBuf, u64)>) -> Self {
        Self { mounts }
    }

    /// The disk holding `path`, by longest mount-point prefix
    fn mount_for(&self, path: &Path) -> Option<&(PathBuf, u64)> {
        let resolved = resolve(path);
        self.mounts
            .iter()
            .filter(|(mount, _)| resolved.starts_with(mount))
            .max_by_key(|(mount, _)| mount.components().count())
    }

    /// Free bytes on the disk holding `path`
    pub fn available(&self, path: &Path) -> Option<u64> {
        self.mount_for(path).map(|(_, free)| *free)
    }

    /// Compare free space with `bytes_per_destination` for every
    /// destination. Destinations sharing a disk add up.
    pub fn check(&self, destinations: &[PathBuf], bytes_per_destination: u64) -> Vec<SpaceCheck> {
        let mut checks: Vec<SpaceCheck> = Vec::new();

        for destination in destinations {
            let (mount, available) = match self.mount_for(destination) {
                Some((mount, free)) => (mount.clone(), Some(*free)),
                None => (destination.clone(), None),
            };

            match checks.iter_mut().find(|c| c.mount == mount && c.available.is_some()) {
                Some(check) if available.is_some() => {
                    check.destinations.push(destination.clone());
                    check.required = check.required.saturating_add(bytes_per_destination);
                }
                _ => checks.push(SpaceCheck {
                    mount,
                    destinations: vec![destination.clone()],
                    required: bytes_per_destination,
                    available,
                }),
            }
        }

        checks
    }
}

/// Canonicalize the nearest existing ancestor and re-append the rest, so
/// destinations that do not exist yet still map to their disk.
fn resolve(path: &Path) -> PathBuf {
    let mut missing = Vec::new();
    let mut current = path;
    loop {
        if let Ok(canonical) = current.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::MediaKind;

    const GB: u64 = 1024 * 1024 * 1024;

    fn summary(photo_bytes: u64, video_bytes: u64, other_bytes: u64) -> SourceSummary {
        let mut summary = SourceSummary::new("/card");
        summary.add(MediaKind::Photo, photo_bytes);
        summary.add(MediaKind::Video, video_bytes);
        summary.add(MediaKind::Other, other_bytes);
        summary
    }

    fn disks() -> DiskSpace {
        DiskSpace::from_mounts(vec![
            (PathBuf::from("/"), 100 * GB),
            (PathBuf::from("/media-organizer-test/archive"), 5 * GB),
        ])
    }

    #[test]
    fn copy_needs_media_once_per_destination() {
        let summaries = [summary(2 * GB, 3 * GB, 0), summary(GB, 0, 0)];
        assert_eq!(
            estimate_required_space(&summaries, 3, OperationMode::Copy),
            18 * GB
        );
    }

    #[test]
    fn move_needs_media_once() {
        let summaries = [summary(2 * GB, 3 * GB, 0)];
        assert_eq!(estimate_required_space(&summaries, 1, OperationMode::Move), 5 * GB);
    }

    #[test]
    fn counted_other_files_are_included() {
        let summaries = [summary(GB, 0, 2 * GB)];
        assert_eq!(bytes_per_destination(&summaries), 3 * GB);
        assert_eq!(estimate_required_space(&summaries, 2, OperationMode::Copy), 6 * GB);
    }

    #[test]
    fn nothing_to_copy_needs_nothing() {
        assert_eq!(estimate_required_space(&[], 2, OperationMode::Copy), 0);
    }

    #[test]
    fn deepest_mount_wins() {
        let disks = disks();
        assert_eq!(
            disks.available(Path::new("/media-organizer-test/archive/2024")),
            Some(5 * GB)
        );
        assert_eq!(disks.available(Path::new("/media-organizer-test/other")), Some(100 * GB));
    }

    #[test]
    fn destinations_on_one_disk_add_up() {
        let destinations = vec![
            PathBuf::from("/media-organizer-test/archive/a"),
            PathBuf::from("/media-organizer-test/archive/b"),
            PathBuf::from("/media-organizer-test/backup"),
        ];
        let checks = disks().check(&destinations, 3 * GB);

        assert_eq!(checks.len(), 2);
        let archive = &checks[0];
        assert_eq!(archive.mount, PathBuf::from("/media-organizer-test/archive"));
        assert_eq!(archive.required, 6 * GB);
        assert!(!archive.is_sufficient());
        assert_eq!(archive.shortfall(), GB);

        let root = &checks[1];
        assert_eq!(root.required, 3 * GB);
        assert!(root.is_sufficient());
    }

    #[test]
    fn unknown_disk_is_assumed_sufficient() {
        let checks = DiskSpace::default().check(&[PathBuf::from("/nowhere")], 10 * GB);
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].available, None);
        assert!(checks[0].is_sufficient());
        assert_eq!(checks[0].shortfall(), 0);
    }

    #[test]
    fn missing_destination_resolves_through_existing_ancestor() {
        let temp = tempfile::TempDir::new().unwrap();
        let canonical = temp.path().canonicalize().unwrap();
        let resolved = resolve(&temp.path().join("not/yet/created"));
        assert_eq!(resolved, canonical.join("not/yet/created"));
    }
}
