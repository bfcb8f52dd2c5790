//! EXIF reading for photos.

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// The EXIF fields the organizer cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifSummary {
    /// DateTimeOriginal, else DateTime
    pub date_taken: Option<NaiveDateTime>,
    /// Camera make (e.g., "Canon")
    pub make: Option<String>,
    /// Camera model (e.g., "EOS R5")
    pub model: Option<String>,
}

/// Read EXIF from a photo. Any failure yields an empty summary.
pub fn read_exif(path: &Path) -> ExifSummary {
    let mut summary = ExifSummary::default();

    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return summary,
    };

    let mut bufreader = BufReader::new(&file);
    let exif_reader = match Reader::new().read_from_container(&mut bufreader) {
        Ok(r) => r,
        Err(_) => return summary,
    };

    summary.date_taken = [Tag::DateTimeOriginal, Tag::DateTime]
        .iter()
        .filter_map(|tag| exif_reader.get_field(*tag, In::PRIMARY))
        .find_map(|field| get_string_value(&field.value).and_then(|s| parse_exif_datetime(&s)));

    if let Some(field) = exif_reader.get_field(Tag::Make, In::PRIMARY) {
        summary.make = get_string_value(&field.value);
    }
    if let Some(field) = exif_reader.get_field(Tag::Model, In::PRIMARY) {
        summary.model = get_string_value(&field.value);
    }

    summary
}

/// Parse "YYYY:MM:DD HH:MM:SS", tolerating dashes and surrounding quotes
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');
    NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Helper to extract string from EXIF ASCII value
fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
