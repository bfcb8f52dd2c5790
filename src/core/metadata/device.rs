//! Device label normalization.
//!
//! Vendor strings vary wildly ("NIKON CORPORATION", "Canon", "Apple").
//! Everything is collapsed into a small canonical set so the ByDevice
//! layout stays tidy.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Label used when no device can be determined
pub const UNKNOWN_DEVICE: &str = "Unknown";

/// Substring (lowercase) → canonical label, checked in order
const VENDORS: &[(&str, &str)] = &[
    ("canon", "Canon"),
    ("nikon", "Nikon"),
    ("sony", "Sony"),
    ("fuji", "Fujifilm"),
    ("olympus", "Olympus"),
    ("panasonic", "Panasonic"),
    ("leica", "Leica"),
    ("apple", "iPhone"),
    ("iphone", "iPhone"),
    ("dji", "DJI"),
    ("gopro", "GoPro"),
];

/// Model fragments that only Sony bodies use
const SONY_MODEL_HINTS: &[&str] = &["a7", "a9", "fx", "rx", "zv", "alpha", "cybershot"];

/// Normalize a camera make. `None` for blank or placeholder input.
pub fn normalize_make(make: &str) -> Option<String> {
    let trimmed = make.trim().trim_end_matches('\0').trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_DEVICE) {
        return None;
    }

    let lower = trimmed.to_lowercase();
    let label = VENDORS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| trimmed.to_string());
    Some(label)
}

/// Guess the vendor from a model string when the make is missing
pub fn device_from_model(model: &str) -> Option<String> {
    let lower = model.to_lowercase();
    if SONY_MODEL_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some("Sony".to_string())
    } else {
        None
    }
}

fn filename_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"^DJI_", "DJI"),
            (r"^(GOPR|GP)", "GoPro"),
            (r"^_?DSC", "Sony"),
            (r"PANO", "DJI"),
            (r"^(SONY|ILCE|ILCA|FX|RX)", "Sony"),
            (r"C000[1-5]", "Sony"),
        ]
        .into_iter()
        .filter_map(|(pattern, label)| Regex::new(pattern).ok().map(|re| (re, label)))
        .collect()
    })
}

/// Guess the device from well-known camera file naming schemes
pub fn device_from_filename(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?.to_uppercase();
    filename_rules()
        .iter()
        .find(|(re, _)| re.is_match(&name))
        .map(|(_, label)| label.to_string())
}

/// Look for DJI/GoPro signatures in a stream handler or encoder tag
pub fn device_from_handler(handler: &str) -> Option<String> {
    let lower = handler.to_lowercase();
    if lower.contains("dji") {
        Some("DJI".to_string())
    } else if lower.contains("gopro") {
        Some("GoPro".to_string())
    } else {
        None
    }
}
