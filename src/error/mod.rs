//! # Error Module
//!
//! User-friendly error types for the media organizer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file errors stay per-file** - only run-level problems stop a run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("{0}")]
    Organize(#[from] OrganizeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that occur while walking a source tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while fingerprinting file content
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path} for hashing: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors for a single file transfer. These never stop a run.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Source file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to overwrite existing file: {path}")]
    TargetExists { path: PathBuf },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("Integrity check failed for {path}: source {source_digest}, copy {target_digest}. The copy was removed.")]
    VerificationFailed {
        path: PathBuf,
        source_digest: String,
        target_digest: String,
    },

    #[error("Copied to {target} but could not remove original {path}: {source}")]
    RemoveSource {
        path: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-level errors. Raised before any file is touched, or when the
/// destination itself becomes unusable.
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("No source directories were given")]
    NoSources,

    #[error("No destination directories were given")]
    NoDestinations,

    #[error("Source directory does not exist: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Source is not a readable directory: {path}")]
    SourceNotDirectory { path: PathBuf },

    #[error("Move mode accepts a single destination, got {count}. Copy to several destinations instead.")]
    MoveToMultipleDestinations { count: usize },

    #[error("Destination is not writable: {path}: {reason}")]
    DestinationUnwritable { path: PathBuf, reason: String },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Errors reading or writing persisted settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is malformed: {reason}. Delete it to restore defaults.")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to serialize settings: {0}")]
    Serialize(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, OrganizerError>;
