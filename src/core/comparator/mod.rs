//! # Comparator Module
//!
//! Decides whether a source file already exists at its destination.
//!
//! ## Strategy
//! 1. Nothing at the candidate path: not a duplicate, no hashing
//! 2. Size differs: not a duplicate, no hashing
//! 3. Sizes equal: compare content fingerprints
//!
//! Numbered siblings (`name_1.ext`, `name_2.ext`, ...) left by earlier
//! collision renames are checked the same way, stopping at the first gap.

use crate::core::hasher::{ContentFingerprinter, Fingerprint};
use crate::core::organize::numbered_variant;
use crate::error::HashError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of a duplicate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateCheck {
    /// Nothing exists at the candidate path
    NoCandidate,
    /// Files exist there, but none has identical content
    Distinct,
    /// `existing` has the same size and fingerprint as the source
    Duplicate { existing: PathBuf },
}

impl DuplicateCheck {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DuplicateCheck::Duplicate { .. })
    }
}

/// Compares a source file against what is already at its destination
#[derive(Debug, Clone)]
pub struct DuplicateResolver {
    fingerprinter: ContentFingerprinter,
    check_numbered_variants: bool,
}

impl DuplicateResolver {
    pub fn new(fingerprinter: ContentFingerprinter) -> Self {
        Self {
            fingerprinter,
            check_numbered_variants: true,
        }
    }

    /// Only look at the exact candidate path, ignoring `_N` siblings
    pub fn with_numbered_variants(mut self, check: bool) -> Self {
        self.check_numbered_variants = check;
        self
    }

    /// Check `source` against the non-duplicate `candidate` path.
    pub fn resolve(&self, source: &Path, candidate: &Path) -> Result<DuplicateCheck, HashError> {
        if !candidate.exists() {
            return Ok(DuplicateCheck::NoCandidate);
        }

        let source_len = fs::metadata(source)
            .map_err(|source_err| HashError::Io {
                path: source.to_path_buf(),
                source: source_err,
            })?
            .len();
        let mut source_digest: Option<Fingerprint> = None;

        let mut existing = candidate.to_path_buf();
        let mut counter = 0usize;
        loop {
            if self.is_same_content(source, source_len, &mut source_digest, &existing)? {
                debug!(source = %source.display(), existing = %existing.display(), "duplicate found");
                return Ok(DuplicateCheck::Duplicate { existing });
            }

            if !self.check_numbered_variants {
                break;
            }
            counter += 1;
            existing = numbered_variant(candidate, counter);
            if !existing.exists() {
                break;
            }
        }

        Ok(DuplicateCheck::Distinct)
    }

    fn is_same_content(
        &self,
        source: &Path,
        source_len: u64,
        source_digest: &mut Option<Fingerprint>,
        existing: &Path,
    ) -> Result<bool, HashError> {
        let existing_meta = match fs::metadata(existing) {
            Ok(meta) if meta.is_file() => meta,
            _ => return Ok(false),
        };
        if existing_meta.len() != source_len {
            return Ok(false);
        }

        let source_fp = match source_digest {
            Some(fp) => *fp,
            None => {
                let fp = self.fingerprinter.fingerprint(source)?;
                *source_digest = Some(fp);
                fp
            }
        };
        Ok(self.fingerprinter.fingerprint(existing)? == source_fp)
    }
}

impl Default for DuplicateResolver {
    fn default() -> Self {
        Self::new(ContentFingerprinter::new())
    }
}
