//! The organization engine.
//!
//! ## States
//! `Idle → Scanning → Processing → Completed | Cancelled | Failed`
//!
//! ## Per file
//! 1. Capture info (photos and videos only)
//! 2. Non-duplicate candidate directory
//! 3. Duplicate check against the candidate path
//! 4. Skip, or classify again (duplicate-aware), allocate a name, transfer
//!
//! (source, destination) pairs fan out on a bounded worker pool. Each pair
//! keeps its own statistics and merges them once it is done.

use super::allocator::UniqueNameAllocator;
use super::classifier::PathClassifier;
use super::cleanup::remove_empty_dirs;
use super::executor::{sanitize_segment, TransferExecutor};
use super::locks::DirectoryLocks;
use super::types::*;
use crate::core::comparator::{DuplicateCheck, DuplicateResolver};
use crate::core::metadata::{CaptureInfo, FallbackMetadataProvider, MetadataProvider};
use crate::core::scanner::{DirectoryScanner, ExtensionRegistry, MediaFile};
use crate::error::{OrganizeError, OrganizerError, TransferError};
use crate::events::{
    null_sender, CancellationToken, Event, EventSender, FileProgress, OrganizeEvent, RunEvent,
};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default number of concurrent (source, destination) pairs
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound on workers
pub const MAX_WORKERS: usize = 16;

/// Attempts before giving up when another writer takes an allocated name
const ALLOCATION_ATTEMPTS: usize = 3;

/// Builder for [`OrganizationEngine`]
pub struct EngineBuilder {
    provider: Arc<dyn MetadataProvider>,
    registry: Arc<ExtensionRegistry>,
    workers: usize,
    cancel: CancellationToken,
    resolver: DuplicateResolver,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            provider: Arc::new(FallbackMetadataProvider),
            registry: Arc::new(ExtensionRegistry::default()),
            workers: DEFAULT_WORKERS,
            cancel: CancellationToken::new(),
            resolver: DuplicateResolver::default(),
        }
    }

    /// Set the metadata provider
    pub fn provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Set the extension sets used by the scanner
    pub fn registry(mut self, registry: Arc<ExtensionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Number of concurrent pairs, clamped to `1..=MAX_WORKERS`
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, MAX_WORKERS);
        self
    }

    /// Share a cancellation token with the caller
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn resolver(mut self, resolver: DuplicateResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn build(self) -> OrganizationEngine {
        OrganizationEngine {
            provider: self.provider,
            registry: self.registry,
            workers: self.workers,
            cancel: self.cancel,
            resolver: self.resolver,
            state: Mutex::new(RunState::Idle),
        }
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts files from sources into destinations
pub struct OrganizationEngine {
    provider: Arc<dyn MetadataProvider>,
    registry: Arc<ExtensionRegistry>,
    workers: usize,
    cancel: CancellationToken,
    resolver: DuplicateResolver,
    state: Mutex<RunState>,
}

/// One unit of work for a worker
struct PairJob<'a> {
    index: usize,
    source_root: &'a Path,
    destination: &'a Path,
    files: &'a [MediaFile],
}

/// What a worker hands back
#[derive(Default)]
struct PairResult {
    statistics: RunStatistics,
    outcomes: Vec<TransferOutcome>,
    failure: Option<String>,
}

/// Shared accumulator; every merge happens under its lock
#[derive(Default)]
struct RunTotals {
    statistics: RunStatistics,
    outcomes: Vec<(usize, Vec<TransferOutcome>)>,
    failure: Option<String>,
}

impl OrganizationEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Token that stops the current run before its next file.
    ///
    /// The flag is cleared when that run finishes, so the engine can be
    /// reused. Cancelling while idle stops the next run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run without events
    pub fn run(&self, request: &OrganizeRequest) -> Result<RunReport, OrganizerError> {
        self.run_with_events(request, &null_sender())
    }

    /// Run, reporting progress on `events`.
    ///
    /// Precondition violations return `Err` before any file is touched.
    /// Everything after that ends in a [`RunReport`], whose state says how
    /// the run ended.
    pub fn run_with_events(
        &self,
        request: &OrganizeRequest,
        events: &EventSender,
    ) -> Result<RunReport, OrganizerError> {
        let start = Instant::now();
        let id = uuid::Uuid::new_v4().to_string();

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = RunState::Idle;
        validate(request)?;
        info!(
            run = %id,
            mode = %request.mode,
            sources = request.sources.len(),
            destinations = request.destinations.len(),
            dry_run = request.dry_run,
            "starting run"
        );

        // Phase 1: Scanning
        self.transition(RunState::Scanning, events);
        let scanner = DirectoryScanner::new(Arc::clone(&self.registry), request.mode.scan_scope());
        let scanned: Vec<(PathBuf, Vec<MediaFile>)> = request
            .sources
            .iter()
            .map(|root| (root.clone(), scanner.scan_with_events(root, events)))
            .collect();

        let jobs: Vec<PairJob<'_>> = scanned
            .iter()
            .flat_map(|(root, files)| {
                request
                    .destinations
                    .iter()
                    .map(move |dest| (root.as_path(), dest.as_path(), files.as_slice()))
            })
            .enumerate()
            .map(|(index, (source_root, destination, files))| PairJob {
                index,
                source_root,
                destination,
                files,
            })
            .collect();

        let total_files: usize = jobs.iter().map(|job| job.files.len()).sum();
        if total_files == 0 {
            info!(run = %id, "nothing to organize");
            return Ok(self.finish(id, RunTotals::default(), 0, start, events, request));
        }

        // Phase 2: Processing
        self.transition(RunState::Processing, events);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| OrganizeError::WorkerPool(e.to_string()))?;

        let locks = DirectoryLocks::new();
        let executor = TransferExecutor::new().dry_run(request.dry_run);
        let totals = Mutex::new(RunTotals::default());

        pool.install(|| {
            jobs.par_iter().for_each(|job| {
                let result = self.process_pair(job, request, &executor, &locks, events);
                let mut totals = totals.lock().unwrap_or_else(PoisonError::into_inner);
                totals.statistics.merge(result.statistics);
                totals.outcomes.push((job.index, result.outcomes));
                if totals.failure.is_none() {
                    totals.failure = result.failure;
                }
            })
        });

        let totals = totals.into_inner().unwrap_or_else(PoisonError::into_inner);

        // Phase 3: Cleanup
        let mut directories_removed = 0;
        if !request.dry_run && totals.failure.is_none() {
            let destinations: BTreeSet<&PathBuf> = request.destinations.iter().collect();
            for destination in destinations {
                directories_removed += remove_empty_dirs(destination);
            }
        }

        Ok(self.finish(id, totals, directories_removed, start, events, request))
    }

    fn finish(
        &self,
        id: String,
        totals: RunTotals,
        directories_removed: usize,
        start: Instant,
        events: &EventSender,
        request: &OrganizeRequest,
    ) -> RunReport {
        let RunTotals {
            statistics,
            mut outcomes,
            failure,
        } = totals;
        outcomes.sort_by_key(|(index, _)| *index);
        let outcomes = outcomes.into_iter().flat_map(|(_, o)| o).collect();

        // A cancellation ends with the run that observed it
        let cancelled = self.cancel.is_cancelled();
        self.cancel.reset();

        let state = if failure.is_some() {
            RunState::Failed
        } else if cancelled {
            RunState::Cancelled
        } else {
            RunState::Completed
        };

        let report = RunReport {
            id,
            state,
            statistics,
            outcomes,
            directories_removed,
            duration_ms: start.elapsed().as_millis() as u64,
            failure,
        };

        self.transition(state, events);
        match (&report.failure, state) {
            (Some(message), _) => {
                warn!(run = %report.id, %message, "run failed");
                events.send(Event::Run(RunEvent::Failed {
                    message: message.clone(),
                }));
            }
            (None, RunState::Cancelled) => {
                info!(run = %report.id, "run cancelled");
                events.send(Event::Run(RunEvent::Cancelled {
                    summary: report.summary(),
                }));
            }
            _ => {
                info!(
                    run = %report.id,
                    processed = report.statistics.processed,
                    duplicates = report.statistics.duplicates,
                    errors = report.statistics.errors,
                    dry_run = request.dry_run,
                    "run completed"
                );
                events.send(Event::Run(RunEvent::Completed {
                    summary: report.summary(),
                }));
            }
        }
        report
    }

    fn transition(&self, state: RunState, events: &EventSender) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
        events.send(Event::Run(RunEvent::StateChanged { state }));
    }

    /// Files of one pair, in scanner order
    fn process_pair(
        &self,
        job: &PairJob<'_>,
        request: &OrganizeRequest,
        executor: &TransferExecutor,
        locks: &DirectoryLocks,
        events: &EventSender,
    ) -> PairResult {
        let mut result = PairResult::default();
        result.statistics.total = job.files.len();

        if !request.dry_run {
            if let Err(e) = fs::create_dir_all(job.destination) {
                result.failure = Some(
                    OrganizeError::DestinationUnwritable {
                        path: job.destination.to_path_buf(),
                        reason: e.to_string(),
                    }
                    .to_string(),
                );
                return result;
            }
        }

        debug!(
            source = %job.source_root.display(),
            destination = %job.destination.display(),
            files = job.files.len(),
            "processing pair"
        );

        for (i, file) in job.files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                debug!(source = %job.source_root.display(), "cancelled");
                break;
            }

            events.send(Event::Organize(OrganizeEvent::Progress(FileProgress {
                source_root: job.source_root.to_path_buf(),
                destination: job.destination.to_path_buf(),
                current: i + 1,
                total: job.files.len(),
                filename: file.file_name(),
            })));

            let (outcome, device) = self.process_file(file, job.destination, request, executor, locks);
            result.statistics.record(&outcome, device.as_deref());

            if !outcome.success {
                warn!(path = %file.path.display(), message = %outcome.message, "file failed");
                if !request.dry_run && !job.destination.is_dir() {
                    result.failure = Some(
                        OrganizeError::DestinationUnwritable {
                            path: job.destination.to_path_buf(),
                            reason: "destination disappeared during the run".to_string(),
                        }
                        .to_string(),
                    );
                }
            }

            events.send(Event::Organize(OrganizeEvent::FileCompleted(outcome.clone())));
            result.outcomes.push(outcome);

            if result.failure.is_some() {
                break;
            }
        }

        result
    }

    /// Returns the outcome and the device label used for the file
    fn process_file(
        &self,
        file: &MediaFile,
        destination: &Path,
        request: &OrganizeRequest,
        executor: &TransferExecutor,
        locks: &DirectoryLocks,
    ) -> (TransferOutcome, Option<String>) {
        let Some(file_name) = file.path.file_name() else {
            let message = format!("{}: not a file name", file.path.display());
            return (TransferOutcome::failed(file.path.clone(), file.kind, false, message), None);
        };

        let info = if file.kind.has_capture_metadata() {
            self.provider.capture_info(&file.path, file.kind)
        } else {
            CaptureInfo::fallback(&file.path)
        };
        let info = CaptureInfo {
            device_label: sanitize_segment(&info.device_label),
            ..info
        };
        let device = file.kind.has_capture_metadata().then(|| info.device_label.clone());

        let candidate_dir = destination.join(PathClassifier::classify(
            &file.path,
            file.kind,
            &info,
            request.mode,
            false,
        ));
        let candidate = candidate_dir.join(file_name);

        let outcome = locks.with_lock(&candidate_dir, || {
            let check = match self.resolver.resolve(&file.path, &candidate) {
                Ok(check) => check,
                Err(e) => {
                    return TransferOutcome::failed(file.path.clone(), file.kind, false, e.to_string())
                }
            };

            if let DuplicateCheck::Duplicate { existing } = &check {
                if request.ignore_duplicates {
                    debug!(path = %file.path.display(), existing = %existing.display(), "skipping duplicate");
                    return TransferOutcome::skipped_duplicate(file.path.clone(), existing, file.kind);
                }
            }

            let is_duplicate = check.is_duplicate();
            let target_dir = if is_duplicate {
                destination.join(PathClassifier::classify(
                    &file.path,
                    file.kind,
                    &info,
                    request.mode,
                    true,
                ))
            } else {
                candidate_dir.clone()
            };

            self.transfer(file, &target_dir.join(file_name), is_duplicate, request, executor)
        });

        (outcome, device)
    }

    fn transfer(
        &self,
        file: &MediaFile,
        desired: &Path,
        is_duplicate: bool,
        request: &OrganizeRequest,
        executor: &TransferExecutor,
    ) -> TransferOutcome {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let target = UniqueNameAllocator::allocate(desired);
            let transfer = TransferRequest::new(&file.path, &target)
                .operation(request.operation)
                .verify(request.verify);

            match executor.transfer(&transfer) {
                Ok(label) => {
                    return TransferOutcome::transferred(
                        file.path.clone(),
                        target,
                        file.kind,
                        label,
                        is_duplicate,
                    )
                }
                Err(TransferError::TargetExists { .. }) if attempt < ALLOCATION_ATTEMPTS => {
                    debug!(target = %target.display(), "name taken by another writer, retrying");
                }
                Err(e) => {
                    return TransferOutcome::failed(
                        file.path.clone(),
                        file.kind,
                        is_duplicate,
                        e.to_string(),
                    )
                }
            }
        }
    }
}

impl Default for OrganizationEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Reject requests that cannot start
fn validate(request: &OrganizeRequest) -> Result<(), OrganizeError> {
    if request.sources.is_empty() {
        return Err(OrganizeError::NoSources);
    }
    if request.destinations.is_empty() {
        return Err(OrganizeError::NoDestinations);
    }
    if request.operation == OperationMode::Move && request.destinations.len() > 1 {
        return Err(OrganizeError::MoveToMultipleDestinations {
            count: request.destinations.len(),
        });
    }

    for source in &request.sources {
        if !source.exists() {
            return Err(OrganizeError::SourceNotFound {
                path: source.clone(),
            });
        }
        if !source.is_dir() || fs::read_dir(source).is_err() {
            return Err(OrganizeError::SourceNotDirectory {
                path: source.clone(),
            });
        }
    }
    Ok(())
}
