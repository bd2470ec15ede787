use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::warn;

/// Environment variable naming the yt-dlp executable
pub const YTDLP_ENV: &str = "VIDEO_DOWNLOADER_YTDLP";

const DEFAULT_YTDLP: &str = "yt-dlp";

/// Runtime settings. There is no config file; everything comes from the
/// environment or sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub ytdlp_program: PathBuf,
    pub download_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), dirs::home_dir().as_deref())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>, home: Option<&Path>) -> Self {
        let ytdlp_program: PathBuf = lookup(YTDLP_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_YTDLP.to_string())
            .into();
        Self { ytdlp_program, download_dir: resolve_download_dir(home) }
    }
}

/// `~/Downloads`, created if missing. Falls back to the working directory.
pub fn default_download_dir() -> PathBuf {
    resolve_download_dir(dirs::home_dir().as_deref())
}

fn resolve_download_dir(home: Option<&Path>) -> PathBuf {
    if let Some(home) = home {
        let downloads = home.join("Downloads");
        match fs::create_dir_all(&downloads) {
            Ok(()) => return downloads,
            Err(err) => warn!(path = %downloads.display(), error = %err, "cannot create downloads folder"),
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
