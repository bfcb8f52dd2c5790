//! Event type definitions for progress reporting.

use crate::core::organize::{RunState, TransferOutcome};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while organizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Per-file organize events
    Organize(OrganizeEvent),
    /// Run-level events
    Run(RunEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning of a source root has started
    Started { root: PathBuf },
    /// An entry could not be read; scanning continues
    Error { message: String },
    /// Scanning of a source root completed
    Completed { root: PathBuf, total_files: usize },
}

/// Events while files are transferred
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrganizeEvent {
    /// A file is about to be processed
    Progress(FileProgress),
    /// A file finished, successfully or not
    FileCompleted(TransferOutcome),
}

/// Progress within one source/destination pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProgress {
    /// Source root being organized
    pub source_root: PathBuf,
    /// Destination root receiving the files
    pub destination: PathBuf,
    /// 1-based index of the current file within this pair
    pub current: usize,
    /// Number of files in this pair
    pub total: usize,
    /// Name of the current file
    pub filename: String,
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// The engine moved to a new state
    StateChanged { state: RunState },
    /// The run finished; errors may still be nonzero
    Completed { summary: RunSummary },
    /// Cancellation was observed
    Cancelled { summary: RunSummary },
    /// A structural failure stopped the run
    Failed { message: String },
}

/// Compact summary shown at the end of every run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub errors: usize,
    pub duration_ms: u64,
}
