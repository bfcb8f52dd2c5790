//! # CLI Module
//!
//! Command-line interface for the media organizer.
//!
//! ## Usage
//! ```bash
//! # Copy a card into the archive by date
//! media-organize organize /Volumes/SD_CARD -d ~/Archive
//!
//! # Preview a move sorted by camera
//! media-organize organize /Volumes/SD_CARD -d ~/Archive --mode device --move --dry-run
//!
//! # What is on the card?
//! media-organize summarize /Volumes/SD_CARD
//!
//! # JSON output
//! media-organize organize ~/Downloads -d ~/Archive --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_organizer::config::Settings;
use media_organizer::core::metadata::{EmbeddedMetadataProvider, FallbackMetadataProvider, MetadataProvider};
use media_organizer::core::organize::{
    OperationMode, OrganizationEngine, OrganizationMode, OrganizeRequest, RunReport, RunState,
};
use media_organizer::core::reporter::{
    bytes_per_destination, estimate_required_space, format_bytes, DiskSpace, SourceSummary, SpaceCheck,
};
use media_organizer::core::scanner::{DirectoryScanner, ScanScope};
use media_organizer::error::{ConfigError, Result};
use media_organizer::events::{Event, EventChannel, OrganizeEvent, RunEvent, ScanEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

/// Media Organizer - sort photos and videos without losing a file
#[derive(Parser, Debug)]
#[command(name = "media-organize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy or move media from sources into destinations
    Organize {
        /// Source directories
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directories
        #[arg(short, long = "dest", required = true)]
        destinations: Vec<PathBuf>,

        /// Destination layout
        #[arg(short, long)]
        mode: Option<Mode>,

        /// Move instead of copy
        #[arg(long, conflicts_with = "copy")]
        r#move: bool,

        /// Copy even if the settings default to moving
        #[arg(long)]
        copy: bool,

        /// Show what would happen without touching any file
        #[arg(long, conflicts_with = "no_dry_run")]
        dry_run: bool,

        /// Transfer for real even if the settings default to a dry run
        #[arg(long)]
        no_dry_run: bool,

        /// Re-hash every copy and compare with its source
        #[arg(long, conflicts_with = "no_verify")]
        verify: bool,

        /// Skip the integrity check
        #[arg(long)]
        no_verify: bool,

        /// Leave duplicates in place instead of filing them
        #[arg(long, conflicts_with = "file_duplicates")]
        ignore_duplicates: bool,

        /// File duplicates under duplicate/ even if the settings ignore them
        #[arg(long)]
        file_duplicates: bool,

        /// Concurrent source/destination pairs
        #[arg(short, long)]
        workers: Option<usize>,

        /// Read EXIF only; never run ffprobe
        #[arg(long)]
        no_ffprobe: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Count photos, videos and other files in directories
    Summarize {
        /// Directories to summarize
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Count non-media files too
        #[arg(long)]
        all_files: bool,

        /// Check free space on these destinations
        #[arg(short, long = "dest")]
        destinations: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show the current settings
    Config {
        /// Restore default settings
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Type/YYYY/YYYY-MM-DD
    Date,
    /// Type/Device
    Device,
    /// Type/YYYY-MM-DD/Device
    DateDevice,
    /// EXT, every file
    Extension,
}

impl From<Mode> for OrganizationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Date => OrganizationMode::ByDate,
            Mode::Device => OrganizationMode::ByDevice,
            Mode::DateDevice => OrganizationMode::ByDateAndDevice,
            Mode::Extension => OrganizationMode::ByExtension,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    media_organizer::init_tracing(cli.verbose);

    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);

    match cli.command {
        Commands::Organize {
            sources,
            destinations,
            mode,
            r#move,
            copy,
            dry_run,
            no_dry_run,
            verify,
            no_verify,
            ignore_duplicates,
            file_duplicates,
            workers,
            no_ffprobe,
            output,
        } => {
            let mut settings = Settings::load_or_default(&settings_path);
            let defaults = &settings.processing;

            let operation = if r#move {
                OperationMode::Move
            } else if copy {
                OperationMode::Copy
            } else {
                defaults.operation
            };
            let request = OrganizeRequest::new(sources, destinations)
                .mode(mode.map(Into::into).unwrap_or(defaults.mode))
                .operation(operation)
                .dry_run(toggle(dry_run, no_dry_run, defaults.dry_run))
                .verify(toggle(verify, no_verify, defaults.verify))
                .ignore_duplicates(toggle(
                    ignore_duplicates,
                    file_duplicates,
                    defaults.ignore_duplicates,
                ));
            let workers = workers.unwrap_or_else(|| defaults.workers());

            let report = run_organize(&settings, &request, workers, no_ffprobe, output, cli.verbose)?;

            if !request.dry_run && report.state != RunState::Failed {
                settings.record_run(&request.sources, &request.destinations);
                if let Err(e) = settings.save(&settings_path) {
                    tracing::warn!(error = %e, "could not remember directories");
                }
            }
            Ok(())
        }
        Commands::Summarize {
            paths,
            all_files,
            destinations,
            output,
        } => {
            let settings = Settings::load_or_default(&settings_path);
            run_summarize(&settings, &paths, all_files, &destinations, output);
            Ok(())
        }
        Commands::Config { reset } => run_config(&settings_path, reset),
    }
}

/// An `--x`/`--no-x` pair over a settings default
fn toggle(on: bool, off: bool, default: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        default
    }
}

fn run_organize(
    settings: &Settings,
    request: &OrganizeRequest,
    workers: usize,
    no_ffprobe: bool,
    output: OutputFormat,
    verbose: bool,
) -> Result<RunReport> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);

    // Print header
    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Media Organizer").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} by {}{}",
            match request.operation {
                OperationMode::Copy => "Copying",
                OperationMode::Move => "Moving",
            },
            style(request.mode).yellow(),
            if request.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        ))
        .ok();
        term.write_line("").ok();
    }

    check_space(settings, request, &term, pretty);

    let provider: Arc<dyn MetadataProvider> = if no_ffprobe {
        Arc::new(EmbeddedMetadataProvider::new())
    } else if request.mode == OrganizationMode::ByExtension {
        Arc::new(FallbackMetadataProvider)
    } else {
        Arc::new(EmbeddedMetadataProvider::detect())
    };

    let engine = OrganizationEngine::builder()
        .provider(provider)
        .registry(Arc::new(settings.extension_registry()))
        .workers(workers)
        .build();

    // Set up event handling
    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if pretty {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let destinations = request.destinations.len() as u64;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Run(RunEvent::StateChanged { state }) => {
                    pb.set_message(format!("{:?}", state));
                }
                Event::Scan(ScanEvent::Completed { total_files, .. }) => {
                    pb.inc_length(total_files as u64 * destinations);
                }
                Event::Organize(OrganizeEvent::Progress(p)) => {
                    pb.set_message(p.filename);
                }
                Event::Organize(OrganizeEvent::FileCompleted(outcome)) => {
                    pb.inc(1);
                    if verbose {
                        pb.println(format!("  {}", outcome.message));
                    }
                }
                Event::Run(RunEvent::Completed { .. })
                | Event::Run(RunEvent::Cancelled { .. })
                | Event::Run(RunEvent::Failed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    // Run the engine
    let result = engine.run_with_events(request, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = result?;
    match output {
        OutputFormat::Pretty => print_pretty_report(&term, &report, request.dry_run, verbose),
        OutputFormat::Json => print_json(&report),
    }
    Ok(report)
}

fn print_pretty_report(term: &Term, report: &RunReport, dry_run: bool, verbose: bool) {
    let stats = &report.statistics;

    let headline = match report.state {
        RunState::Completed => format!("{} Run Complete", style("✓").green().bold()),
        RunState::Cancelled => format!("{} Run Cancelled", style("■").yellow().bold()),
        _ => format!("{} Run Failed", style("✗").red().bold()),
    };
    term.write_line(&headline).ok();
    if let Some(ref failure) = report.failure {
        term.write_line(&format!("  {}", style(failure).red())).ok();
    }
    term.write_line("").ok();

    // Summary
    term.write_line(&format!(
        "  {} of {} files {} in {:.1}s",
        style(stats.processed).cyan(),
        stats.total,
        if dry_run { "planned" } else { "organized" },
        report.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} photos, {} videos, {} other",
        style(stats.photos).cyan(),
        style(stats.videos).cyan(),
        style(stats.other).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicates ({} skipped)",
        style(stats.duplicates).yellow(),
        stats.skipped
    ))
    .ok();
    if !stats.devices.is_empty() {
        let devices: Vec<&str> = stats.devices.iter().map(String::as_str).collect();
        term.write_line(&format!("  Devices: {}", devices.join(", "))).ok();
    }
    if report.directories_removed > 0 {
        term.write_line(&format!(
            "  {} empty folders removed",
            style(report.directories_removed).dim()
        ))
        .ok();
    }
    if stats.errors > 0 {
        term.write_line(&format!("  {} errors", style(stats.errors).red().bold())).ok();
    }
    term.write_line("").ok();

    // Preview or failures
    if dry_run || verbose {
        for outcome in report.outcomes.iter().filter(|o| o.success) {
            let target = outcome
                .target
                .as_deref()
                .map(display_path)
                .unwrap_or_else(|| outcome.message.clone());
            term.write_line(&format!(
                "  {} {} → {}",
                style(outcome.operation).dim(),
                display_path(&outcome.source),
                target
            ))
            .ok();
        }
    }
    for outcome in report.outcomes.iter().filter(|o| !o.success) {
        term.write_line(&format!("  {} {}", style("✗").red(), outcome.message)).ok();
    }
}

/// Warn when a destination disk looks too small for the run
fn check_space(settings: &Settings, request: &OrganizeRequest, term: &Term, pretty: bool) {
    let scanner = DirectoryScanner::new(
        Arc::new(settings.extension_registry()),
        request.mode.scan_scope(),
    );
    let summaries: Vec<SourceSummary> = request
        .sources
        .iter()
        .filter(|source| source.is_dir())
        .map(|source| SourceSummary::collect(&scanner, source))
        .collect();

    let required =
        estimate_required_space(&summaries, request.destinations.len(), request.operation);
    tracing::debug!(required, "estimated space");

    let checks = DiskSpace::from_system().check(&request.destinations, bytes_per_destination(&summaries));
    for check in checks.iter().filter(|c| !c.is_sufficient()) {
        tracing::warn!(
            mount = %check.mount.display(),
            required = check.required,
            available = ?check.available,
            "destination may run out of space"
        );
        if pretty {
            term.write_line(&format!("{} {}", style("!").yellow().bold(), space_warning(check)))
                .ok();
        }
    }
}

fn space_warning(check: &SpaceCheck) -> String {
    format!(
        "{} needs {} but only {} is free ({} short)",
        display_path(&check.mount),
        format_bytes(check.required),
        format_bytes(check.available.unwrap_or(0)),
        format_bytes(check.shortfall())
    )
}

fn run_summarize(
    settings: &Settings,
    paths: &[PathBuf],
    all_files: bool,
    destinations: &[PathBuf],
    output: OutputFormat,
) {
    let scope = if all_files {
        ScanScope::AllFiles
    } else {
        ScanScope::MediaOnly
    };
    let scanner = DirectoryScanner::new(Arc::new(settings.extension_registry()), scope);
    let summaries: Vec<SourceSummary> = paths
        .iter()
        .map(|path| SourceSummary::collect(&scanner, path))
        .collect();

    let checks = if destinations.is_empty() {
        Vec::new()
    } else {
        DiskSpace::from_system().check(destinations, bytes_per_destination(&summaries))
    };

    match output {
        OutputFormat::Json => print_json(&serde_json::json!({
            "sources": summaries,
            "space": checks,
        })),
        OutputFormat::Pretty => {
            let term = Term::stdout();
            for summary in &summaries {
                term.write_line(&format!("{}", style(display_path(&summary.root)).bold())).ok();
                for (label, totals) in [
                    ("Photos", summary.photos),
                    ("Videos", summary.videos),
                    ("Other", summary.other),
                ] {
                    if totals.files == 0 && label == "Other" && !all_files {
                        continue;
                    }
                    term.write_line(&format!(
                        "  {:<7} {:>7}  {}",
                        label,
                        style(totals.files).cyan(),
                        format_bytes(totals.bytes)
                    ))
                    .ok();
                }
                let total = summary.total();
                term.write_line(&format!(
                    "  {:<7} {:>7}  {}",
                    "Total",
                    style(total.files).cyan().bold(),
                    style(format_bytes(total.bytes)).yellow()
                ))
                .ok();
                term.write_line("").ok();
            }

            for check in &checks {
                let line = if check.is_sufficient() {
                    format!(
                        "{} {} needs {}, {} free",
                        style("✓").green(),
                        display_path(&check.mount),
                        format_bytes(check.required),
                        check
                            .available
                            .map(format_bytes)
                            .unwrap_or_else(|| "unknown".to_string())
                    )
                } else {
                    format!("{} {}", style("!").yellow().bold(), space_warning(check))
                };
                term.write_line(&line).ok();
            }
        }
    }
}

fn run_config(path: &Path, reset: bool) -> Result<()> {
    let settings = if reset {
        let settings = Settings::default();
        settings.save(path)?;
        settings
    } else {
        Settings::load(path)?
    };

    let json =
        serde_json::to_string_pretty(&settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;
    println!("{}", style(path.display()).dim());
    println!("{}", json);
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}
