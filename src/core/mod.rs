//! # Core Module
//!
//! The UI-agnostic organization engine.
//!
//! ## Modules
//! - `scanner` - Discovers media files in source trees
//! - `metadata` - Capture date and device for a file
//! - `hasher` - Content fingerprints
//! - `comparator` - Decides whether a file already exists at its destination
//! - `organize` - Classification, naming, transfers and the engine itself
//! - `reporter` - Source summaries and free-space checks

pub mod comparator;
pub mod hasher;
pub mod metadata;
pub mod organize;
pub mod reporter;
pub mod scanner;

// Re-export commonly used types
pub use comparator::{DuplicateCheck, DuplicateResolver};
pub use hasher::{ContentFingerprinter, Fingerprint};
pub use metadata::{CaptureInfo, MetadataProvider};
pub use organize::{OrganizationEngine, OrganizationMode, OrganizeRequest, RunReport, RunStatistics};
pub use reporter::SourceSummary;
pub use scanner::{MediaFile, MediaKind};
