use std::{io, path::PathBuf};

use thiserror::Error;

use crate::model::{LogEntry, LogLevel};

/// Input problems caught on the UI thread before any task is spawned.
/// The `Display` text is what the user sees.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Please enter a URL")]
    MissingUrl,
    #[error("Please enter a video URL.")]
    MissingVideoUrl,
    #[error("Please select a quality.")]
    MissingQuality,
    #[error("Already downloading. Please wait...")]
    AlreadyDownloading,
    #[error("Cannot create directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ValidationError {
    pub fn to_log_entry(&self) -> LogEntry {
        let level = match self {
            ValidationError::AlreadyDownloading => LogLevel::Emphasis,
            _ => LogLevel::Error,
        };
        LogEntry::new(level, self.to_string())
    }
}

/// Format listing failed inside the fetch task
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to launch extractor: {0}")]
    Launch(#[source] io::Error),
    #[error("extractor exited with status {code}: {stderr}")]
    Exit { code: i32, stderr: String },
    #[error("malformed extractor output: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("extractor reported no formats")]
    NoFormats,
    #[error("fetch task aborted: {0}")]
    Aborted(String),
}

impl ExtractionError {
    pub fn user_message(&self) -> &'static str {
        "Failed to fetch qualities. Check URL or connection."
    }
}

/// Download failed inside the download task
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to launch extractor: {0}")]
    Launch(#[source] io::Error),
    #[error("lost extractor output: {0}")]
    Io(#[source] io::Error),
    #[error("extractor exited with status {0}")]
    Exit(i32),
    #[error("download task aborted: {0}")]
    Aborted(String),
}

impl DownloadError {
    pub fn user_message(&self) -> &'static str {
        "Download failed. Check URL or connection."
    }
}

/// Failures that stop the application before the window opens
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("failed to open window: {0}")]
    Gui(#[from] eframe::Error),
}
