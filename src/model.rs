use std::path::PathBuf;

use serde::Deserialize;

/// Container the extractor merges audio and video into
pub const MERGE_CONTAINER: &str = "mp4";

/// One stream variant as reported by the extractor's JSON listing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub vcodec: Option<String>,
    pub format_note: Option<String>,
    pub ext: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub tbr: Option<f64>,
}

/// Top-level object printed by `yt-dlp -J`
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    pub title: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// How a log line is rendered in the log panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Emphasis,
    Success,
    Error,
}

/// A single line of the user-visible log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub text: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self { level, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, text)
    }

    pub fn emphasis(text: impl Into<String>) -> Self {
        Self::new(LogLevel::Emphasis, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, text)
    }
}

/// Phase tag carried by a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Downloading,
    Finished,
}

impl ProgressPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressPhase::Downloading => "downloading",
            ProgressPhase::Finished => "finished",
        }
    }
}

/// Periodic update emitted while the extractor downloads.
/// `total_bytes == 0` means the size is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
}

/// Immutable snapshot of everything a download task needs.
/// Built when the download button is pressed; later edits to the form
/// do not reach an in-flight task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub source_url: String,
    pub format_selector: String,
    pub output_directory: PathBuf,
}

impl DownloadTarget {
    /// Output template rooted at the chosen directory, in yt-dlp syntax
    pub fn output_template(&self) -> PathBuf {
        self.output_directory.join("%(title)s.%(ext)s")
    }

    pub fn request(&self) -> DownloadRequest {
        DownloadRequest {
            url: self.source_url.clone(),
            format_selector: self.format_selector.clone(),
            output_template: self.output_template(),
            merge_container: MERGE_CONTAINER,
        }
    }
}

/// Arguments handed to [`crate::extractor::Extractor::download`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format_selector: String,
    pub output_template: PathBuf,
    pub merge_container: &'static str,
}
