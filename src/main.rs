//! # media-organize CLI
//!
//! Command-line interface for the media organizer.
//!
//! ## Usage
//! ```bash
//! media-organize organize /Volumes/SD_CARD -d ~/Archive --verify
//! media-organize summarize /Volumes/SD_CARD --output json
//! ```

mod cli;

use media_organizer::Result;

fn main() -> Result<()> {
    cli::run()
}
