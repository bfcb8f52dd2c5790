//! Types for the organize module.

use crate::core::scanner::{MediaKind, ScanScope};
use crate::events::RunSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Destination layout for a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationMode {
    /// `{TypeRoot}/{YYYY}/{YYYY-MM-DD}`
    #[default]
    ByDate,
    /// `{TypeRoot}/{device}`
    ByDevice,
    /// `{TypeRoot}/{YYYY-MM-DD}/{device}`
    ByDateAndDevice,
    /// `{EXT}`, regardless of kind
    ByExtension,
}

impl OrganizationMode {
    /// Extension mode takes every file; the others take media only
    pub fn scan_scope(&self) -> ScanScope {
        match self {
            OrganizationMode::ByExtension => ScanScope::AllFiles,
            _ => ScanScope::MediaOnly,
        }
    }
}

impl fmt::Display for OrganizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrganizationMode::ByDate => "date",
            OrganizationMode::ByDevice => "device",
            OrganizationMode::ByDateAndDevice => "date and device",
            OrganizationMode::ByExtension => "extension",
        };
        f.write_str(name)
    }
}

/// Operation mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    /// Copy files to destination (keep originals)
    #[default]
    Copy,
    /// Move files to destination
    Move,
}

/// Everything the engine needs for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeRequest {
    pub sources: Vec<PathBuf>,
    pub destinations: Vec<PathBuf>,
    pub mode: OrganizationMode,
    pub operation: OperationMode,
    /// Report what would happen without touching the filesystem
    pub dry_run: bool,
    /// Re-hash source and target after each copy
    pub verify: bool,
    /// Leave duplicates where they are instead of filing them
    pub ignore_duplicates: bool,
}

impl OrganizeRequest {
    /// Copy by date, no verification, duplicates filed
    pub fn new(sources: Vec<PathBuf>, destinations: Vec<PathBuf>) -> Self {
        Self {
            sources,
            destinations,
            mode: OrganizationMode::default(),
            operation: OperationMode::default(),
            dry_run: false,
            verify: false,
            ignore_duplicates: false,
        }
    }

    pub fn mode(mut self, mode: OrganizationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn operation(mut self, operation: OperationMode) -> Self {
        self.operation = operation;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn ignore_duplicates(mut self, ignore: bool) -> Self {
        self.ignore_duplicates = ignore;
        self
    }
}

/// One planned transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source: PathBuf,
    /// Final, already allocated target path
    pub target: PathBuf,
    pub operation: OperationMode,
    pub verify: bool,
}

impl TransferRequest {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            operation: OperationMode::Copy,
            verify: false,
        }
    }

    pub fn operation(mut self, operation: OperationMode) -> Self {
        self.operation = operation;
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Directory the target lands in
    pub fn target_dir(&self) -> &Path {
        self.target.parent().unwrap_or(Path::new(""))
    }
}

/// What was done with a file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationLabel {
    Copied,
    Moved,
    Skipped,
    WouldCopy,
    WouldMove,
    Failed,
}

impl OperationLabel {
    /// Label for a finished transfer
    pub fn performed(operation: OperationMode, dry_run: bool) -> Self {
        match (operation, dry_run) {
            (OperationMode::Copy, false) => OperationLabel::Copied,
            (OperationMode::Move, false) => OperationLabel::Moved,
            (OperationMode::Copy, true) => OperationLabel::WouldCopy,
            (OperationMode::Move, true) => OperationLabel::WouldMove,
        }
    }
}

impl fmt::Display for OperationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OperationLabel::Copied => "copied",
            OperationLabel::Moved => "moved",
            OperationLabel::Skipped => "skipped",
            OperationLabel::WouldCopy => "would copy",
            OperationLabel::WouldMove => "would move",
            OperationLabel::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Result record for one file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferOutcome {
    pub source: PathBuf,
    pub success: bool,
    /// Where the file ended up (or would end up); `None` if skipped or failed
    pub target: Option<PathBuf>,
    pub message: String,
    pub is_duplicate: bool,
    pub operation: OperationLabel,
    pub kind: MediaKind,
}

impl TransferOutcome {
    pub fn transferred(
        source: PathBuf,
        target: PathBuf,
        kind: MediaKind,
        operation: OperationLabel,
        is_duplicate: bool,
    ) -> Self {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let message = if is_duplicate {
            format!("{} duplicate {} to {}", operation, name, target.display())
        } else {
            format!("{} {} to {}", operation, name, target.display())
        };
        Self {
            source,
            success: true,
            target: Some(target),
            message,
            is_duplicate,
            operation,
            kind,
        }
    }

    /// Duplicate left in place under the ignore-duplicates policy
    pub fn skipped_duplicate(source: PathBuf, existing: &Path, kind: MediaKind) -> Self {
        let message = format!("skipped duplicate of {}", existing.display());
        Self {
            source,
            success: true,
            target: None,
            message,
            is_duplicate: true,
            operation: OperationLabel::Skipped,
            kind,
        }
    }

    pub fn failed(source: PathBuf, kind: MediaKind, is_duplicate: bool, message: String) -> Self {
        Self {
            source,
            success: false,
            target: None,
            message,
            is_duplicate,
            operation: OperationLabel::Failed,
            kind,
        }
    }
}

/// Counters for one run.
///
/// Workers fill their own instance and merge it into the shared one, so
/// every field must combine by sum or union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Files found by the scanner
    pub total: usize,
    /// Files transferred (or that would be, in a dry run)
    pub processed: usize,
    pub photos: usize,
    pub videos: usize,
    pub other: usize,
    /// Files whose content already existed at the destination
    pub duplicates: usize,
    /// Duplicates left in place
    pub skipped: usize,
    pub errors: usize,
    /// Device labels seen on processed photos and videos
    pub devices: BTreeSet<String>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome in. `device` is the label used for the file, if any.
    pub fn record(&mut self, outcome: &TransferOutcome, device: Option<&str>) {
        if !outcome.success {
            self.errors += 1;
            return;
        }

        if outcome.is_duplicate {
            self.duplicates += 1;
        }

        if outcome.operation == OperationLabel::Skipped {
            self.skipped += 1;
            return;
        }

        self.processed += 1;
        match outcome.kind {
            MediaKind::Photo => self.photos += 1,
            MediaKind::Video => self.videos += 1,
            MediaKind::Other => self.other += 1,
        }
        if let (true, Some(label)) = (outcome.kind.has_capture_metadata(), device) {
            self.devices.insert(label.to_string());
        }
    }

    /// Add another accumulator into this one
    pub fn merge(&mut self, other: RunStatistics) {
        self.total += other.total;
        self.processed += other.processed;
        self.photos += other.photos;
        self.videos += other.videos;
        self.other += other.other;
        self.duplicates += other.duplicates;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.devices.extend(other.devices);
    }

    pub fn summary(&self, duration_ms: u64) -> RunSummary {
        RunSummary {
            total: self.total,
            processed: self.processed,
            duplicates: self.duplicates,
            skipped: self.skipped,
            errors: self.errors,
            duration_ms,
        }
    }
}

/// Engine state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Scanning,
    Processing,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }
}

/// Everything a finished run hands back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: String,
    pub state: RunState,
    pub statistics: RunStatistics,
    /// Per-file outcomes, grouped by source/destination pair
    pub outcomes: Vec<TransferOutcome>,
    /// Empty directories removed after the run
    pub directories_removed: usize,
    pub duration_ms: u64,
    /// Set when the run ended in [`RunState::Failed`]
    pub failure: Option<String>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        self.statistics.summary(self.duration_ms)
    }
}
