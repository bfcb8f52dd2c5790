//! Media organization module.
//!
//! Sorts photos and videos from source trees into a destination layout by
//! date, device or extension, filing byte-identical duplicates separately.

mod allocator;
mod classifier;
mod cleanup;
mod engine;
mod executor;
mod locks;
mod types;

pub use allocator::{numbered_variant, UniqueNameAllocator};
pub use classifier::{PathClassifier, DUPLICATE_DIR, NO_EXTENSION};
pub use cleanup::remove_empty_dirs;
pub use engine::{EngineBuilder, OrganizationEngine, DEFAULT_WORKERS, MAX_WORKERS};
pub use executor::{sanitize_segment, TransferExecutor};
pub use locks::DirectoryLocks;
pub use types::*;
