//! Copies and moves single files.
//!
//! ## Guarantees
//! - An existing target is never overwritten (create-new semantics)
//! - A partially written or unverified target is removed
//! - A source is only removed once its copy is complete (and verified,
//!   when requested)

use super::types::{OperationLabel, OperationMode, TransferRequest};
use crate::core::hasher::ContentFingerprinter;
use crate::error::TransferError;
use filetime::FileTime;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Characters that are not allowed in a path segment on common filesystems
const ILLEGAL_SEGMENT_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest segment most filesystems accept, in bytes
const MAX_SEGMENT_BYTES: usize = 255;

/// Make an arbitrary label safe to use as one directory name
pub fn sanitize_segment(label: &str) -> String {
    let replaced: String = label
        .chars()
        .map(|c| {
            if ILLEGAL_SEGMENT_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == ' ' || c == '.');
    if trimmed.is_empty() {
        return "untitled".to_string();
    }

    let mut end = trimmed.len().min(MAX_SEGMENT_BYTES);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

/// Performs transfers, or only describes them in a dry run
#[derive(Debug, Clone, Default)]
pub struct TransferExecutor {
    fingerprinter: ContentFingerprinter,
    dry_run: bool,
}

impl TransferExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fingerprinter(mut self, fingerprinter: ContentFingerprinter) -> Self {
        self.fingerprinter = fingerprinter;
        self
    }

    /// Report transfers without touching the filesystem
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Copy or move `request.source` to `request.target`.
    ///
    /// On error the source is always still in place.
    pub fn transfer(&self, request: &TransferRequest) -> Result<OperationLabel, TransferError> {
        let source = request.source.as_path();
        let target = request.target.as_path();

        if !source.is_file() {
            return Err(TransferError::SourceMissing {
                path: source.to_path_buf(),
            });
        }

        if self.dry_run {
            return Ok(OperationLabel::performed(request.operation, true));
        }

        let parent = request.target_dir();
        fs::create_dir_all(parent).map_err(|e| TransferError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;

        if request.operation == OperationMode::Move && !request.verify && self.try_rename(source, target)? {
            debug!(from = %source.display(), to = %target.display(), "renamed");
            return Ok(OperationLabel::Moved);
        }

        self.copy_new(source, target)?;
        self.finish_copy(request)
    }

    /// Verify a written copy if requested, then drop the source on a move.
    /// A copy that fails verification is removed and the source kept.
    fn finish_copy(&self, request: &TransferRequest) -> Result<OperationLabel, TransferError> {
        let source = request.source.as_path();
        let target = request.target.as_path();

        if request.verify {
            self.verify(source, target)?;
        }

        if request.operation == OperationMode::Move {
            fs::remove_file(source).map_err(|e| TransferError::RemoveSource {
                path: source.to_path_buf(),
                target: target.to_path_buf(),
                source: e,
            })?;
            debug!(from = %source.display(), to = %target.display(), "moved");
            return Ok(OperationLabel::Moved);
        }

        debug!(from = %source.display(), to = %target.display(), "copied");
        Ok(OperationLabel::Copied)
    }

    /// Same-filesystem move. `Ok(false)` means fall back to copy.
    fn try_rename(&self, source: &Path, target: &Path) -> Result<bool, TransferError> {
        if target.symlink_metadata().is_ok() {
            return Err(TransferError::TargetExists {
                path: target.to_path_buf(),
            });
        }
        match fs::rename(source, target) {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!(error = %e, "rename failed, copying instead");
                Ok(false)
            }
        }
    }

    /// Copy content into a target that must not exist yet, then carry over
    /// permissions and timestamps. A failed copy leaves no target behind.
    fn copy_new(&self, source: &Path, target: &Path) -> Result<(), TransferError> {
        let copy_error = |e: io::Error| TransferError::Copy {
            from: source.to_path_buf(),
            to: target.to_path_buf(),
            source: e,
        };

        let input = File::open(source).map_err(copy_error)?;
        let output = match OpenOptions::new().write(true).create_new(true).open(target) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(TransferError::TargetExists {
                    path: target.to_path_buf(),
                })
            }
            Err(e) => return Err(copy_error(e)),
        };

        let written = write_all(input, output);
        if let Err(e) = written {
            remove_partial(target);
            return Err(copy_error(e));
        }

        preserve_metadata(source, target);
        Ok(())
    }

    fn verify(&self, source: &Path, target: &Path) -> Result<(), TransferError> {
        let digests = self
            .fingerprinter
            .fingerprint(source)
            .and_then(|s| Ok((s, self.fingerprinter.fingerprint(target)?)));

        match digests {
            Ok((source_fp, target_fp)) if source_fp == target_fp => Ok(()),
            Ok((source_fp, target_fp)) => {
                warn!(path = %target.display(), "verification mismatch, removing copy");
                remove_partial(target);
                Err(TransferError::VerificationFailed {
                    path: target.to_path_buf(),
                    source_digest: source_fp.to_string(),
                    target_digest: target_fp.to_string(),
                })
            }
            Err(e) => {
                remove_partial(target);
                Err(e.into())
            }
        }
    }
}

fn write_all(input: File, output: File) -> io::Result<()> {
    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}

fn preserve_metadata(source: &Path, target: &Path) {
    let meta = match fs::metadata(source) {
        Ok(meta) => meta,
        Err(e) => {
            warn!(path = %source.display(), error = %e, "could not read source metadata");
            return;
        }
    };

    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    if let Err(e) = filetime::set_file_times(target, atime, mtime) {
        warn!(path = %target.display(), error = %e, "could not preserve timestamps");
    }
    if let Err(e) = fs::set_permissions(target, meta.permissions()) {
        warn!(path = %target.display(), error = %e, "could not preserve permissions");
    }
}

/// Remove a target this transfer created
fn remove_partial(target: &Path) {
    if let Err(e) = fs::remove_file(target) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %target.display(), error = %e, "could not remove partial copy");
        }
    }
}
