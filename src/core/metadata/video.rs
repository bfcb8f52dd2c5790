//! Video metadata through `ffprobe`.
//!
//! The tool is optional. When it is missing, fails, prints garbage or runs
//! past the timeout, the reader returns nothing and the caller falls back.

use super::device::{device_from_handler, normalize_make};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default upper bound for one probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

const FORMAT_DATE_TAGS: &[&str] = &[
    "creation_time",
    "date",
    "DATE",
    "com.apple.quicktime.creationdate",
];
const STREAM_DATE_TAGS: &[&str] = &["creation_time", "date", "DATE"];
const DEVICE_TAGS: &[&str] = &[
    "make",
    "model",
    "camera_make",
    "camera_model",
    "com.apple.quicktime.make",
    "com.apple.quicktime.model",
];
const HANDLER_TAGS: &[&str] = &["handler_name", "encoder"];

/// What a probe found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    pub created: Option<NaiveDateTime>,
    pub device: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeSection>,
    #[serde(default)]
    streams: Vec<ProbeSection>,
}

#[derive(Debug, Deserialize, Default)]
struct ProbeSection {
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Runs `ffprobe -show_format -show_streams` and reads its JSON
#[derive(Debug, Clone)]
pub struct FfprobeReader {
    program: PathBuf,
    timeout: Duration,
}

impl FfprobeReader {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Use a specific executable instead of `ffprobe` from `PATH`
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether `<program> -version` runs successfully
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Probe one file. `None` on any failure.
    pub fn probe(&self, path: &Path) -> Option<VideoMetadata> {
        let stdout = self.run(path)?;
        let metadata = parse_probe_output(&stdout);
        if metadata.is_none() {
            debug!(path = %path.display(), "ffprobe output was not usable");
        }
        metadata
    }

    fn run(&self, path: &Path) -> Option<String> {
        let mut child = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .ok()?;

        // Drain stdout on a helper thread so a chatty probe cannot block on a full pipe
        let mut pipe = child.stdout.take()?;
        let reader = thread::spawn(move || {
            let mut buf = String::new();
            pipe.read_to_string(&mut buf).map(|_| buf)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    debug!(path = %path.display(), "ffprobe timed out");
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(_) => return None,
            }
        };

        let output = reader.join().ok()?.ok()?;
        status.success().then_some(output)
    }
}

impl Default for FfprobeReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract creation date and device from ffprobe's JSON.
///
/// Format tags are checked before stream tags. `None` when the text is not
/// valid probe JSON.
pub fn parse_probe_output(json: &str) -> Option<VideoMetadata> {
    let output: ProbeOutput = serde_json::from_str(json).ok()?;
    let format_tags = output.format.as_ref().map(|f| &f.tags);

    let created = format_tags
        .and_then(|tags| first_date(tags, FORMAT_DATE_TAGS))
        .or_else(|| {
            output
                .streams
                .iter()
                .find_map(|stream| first_date(&stream.tags, STREAM_DATE_TAGS))
        });

    let device = format_tags
        .and_then(|tags| {
            DEVICE_TAGS
                .iter()
                .filter_map(|tag| tags.get(*tag))
                .find_map(|value| normalize_make(value))
        })
        .or_else(|| {
            output.streams.iter().find_map(|stream| {
                HANDLER_TAGS
                    .iter()
                    .filter_map(|tag| stream.tags.get(*tag))
                    .find_map(|value| device_from_handler(value))
            })
        });

    Some(VideoMetadata { created, device })
}

fn first_date(tags: &HashMap<String, String>, names: &[&str]) -> Option<NaiveDateTime> {
    names
        .iter()
        .filter_map(|name| tags.get(*name))
        .find_map(|value| parse_video_datetime(value))
}

/// ISO-8601 (offset dropped, wall-clock kept) or `YYYY-MM-DD HH:MM:SS`
pub fn parse_video_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.contains('T') {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.naive_local())
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    } else {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
    }
}
