//! # Media Organizer
//!
//! Sorts photos and videos off cameras, phones and drones into a dated
//! archive without ever losing a file.
//!
//! ## Core Philosophy
//! - **Never overwrite** - Name collisions get `_1`, `_2`, ... suffixes
//! - **Never lose a source** - Originals are removed only after a complete copy
//! - **Rerun safely** - Byte-identical files are recognized as duplicates
//!
//! ## Architecture
//! - `core` - The organization engine
//! - `config` - Persisted settings
//! - `events` - Event-driven progress reporting and cancellation
//! - `error` - User-friendly error types

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{OrganizerError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG`
/// overrides the default level; `verbose` raises that default to `debug`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // A subscriber may already be installed (tests, embedding apps)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
