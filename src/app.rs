use std::{fs, path::PathBuf};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::catalog::format_selector_for;
use crate::config::default_download_dir;
use crate::dir_chooser::DirChooser;
use crate::dispatcher::MainThreadQueue;
use crate::error::ValidationError;
use crate::model::{DownloadTarget, LogEntry};
use crate::state::UiState;
use crate::tasks::TaskRunner;

/// Application state for the GUI: the observable store, the editable
/// form fields, and the user intents that validate input and start tasks.
pub struct DownloaderApp {
    pub state: UiState,
    /// Contents of the URL field
    pub url_input: String,
    /// Contents of the "Save to" field
    pub path_input: String,
    /// Open directory chooser popup, if any
    pub chooser: Option<DirChooser>,
    runner: TaskRunner,
    queue: MainThreadQueue,
}

impl DownloaderApp {
    pub fn new(runner: TaskRunner, queue: MainThreadQueue, save_path: PathBuf) -> Self {
        Self {
            path_input: save_path.display().to_string(),
            state: UiState::new(save_path),
            url_input: String::new(),
            chooser: None,
            runner,
            queue,
        }
    }

    /// Replays worker requests onto the state; call before rendering
    pub fn pump(&mut self) -> usize {
        self.queue.pump(&mut self.state)
    }

    fn reject(&mut self, err: ValidationError) {
        debug!(reason = %err, "intent rejected");
        self.state.append_log(err.to_log_entry());
    }

    pub fn fetch_qualities(&mut self) -> Option<JoinHandle<()>> {
        let url = self.url_input.trim().to_string();
        if url.is_empty() {
            self.reject(ValidationError::MissingUrl);
            return None;
        }
        self.state.append_log(LogEntry::info("Fetching available formats..."));
        let generation = self.state.begin_fetch();
        info!(%url, generation, "fetching qualities");
        Some(self.runner.spawn_fetch(url, generation))
    }

    pub fn choose_quality(&mut self, entry: &str) {
        self.state.select_quality(entry);
        self.state.close_quality_popup();
    }

    pub fn start_download(&mut self) -> Option<JoinHandle<()>> {
        match self.prepare_download() {
            Ok(target) => {
                self.state.begin_download();
                info!(url = %target.source_url, format = %target.format_selector, "starting download");
                Some(self.runner.spawn_download(target))
            }
            Err(err) => {
                self.reject(err);
                None
            }
        }
    }

    /// Validates the form and snapshots it into a [`DownloadTarget`]
    fn prepare_download(&mut self) -> Result<DownloadTarget, ValidationError> {
        if self.state.is_downloading() {
            return Err(ValidationError::AlreadyDownloading);
        }
        let url = self.url_input.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingVideoUrl);
        }
        let quality = self.state.selected_quality().ok_or(ValidationError::MissingQuality)?;
        let format_selector = format_selector_for(quality);

        let typed = self.path_input.trim();
        let dir = if typed.is_empty() { default_download_dir() } else { PathBuf::from(typed) };
        self.state.set_save_path(dir.clone());
        fs::create_dir_all(&dir).map_err(|source| ValidationError::Directory { path: dir.clone(), source })?;

        Ok(DownloadTarget { source_url: url.to_string(), format_selector, output_directory: dir })
    }

    pub fn open_dir_chooser(&mut self) {
        self.chooser = Some(DirChooser::open(self.state.save_path()));
    }

    /// Applies the chooser's selection; keeps the popup open if nothing is chosen
    pub fn confirm_dir_chooser(&mut self) {
        let Some(dir) = self.chooser.as_ref().and_then(DirChooser::confirm) else {
            return;
        };
        self.chooser = None;
        self.path_input = dir.display().to_string();
        self.state.append_log(LogEntry::info(format!("Download directory changed to: {}", dir.display())));
        self.state.set_save_path(dir);
    }

    pub fn cancel_dir_chooser(&mut self) {
        self.chooser = None;
    }
}
