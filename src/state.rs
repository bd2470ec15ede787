use std::{collections::VecDeque, path::PathBuf};

use tracing::debug;

use crate::dispatcher::UiCommand;
use crate::model::LogEntry;

/// Observable state the window renders. Owned and mutated by the UI
/// thread only; workers reach it through [`UiCommand`]s.
pub struct UiState {
    status: String,
    /// Newest first
    log: VecDeque<LogEntry>,
    progress: f32,
    downloading: bool,
    catalog: Vec<String>,
    selected_quality: Option<String>,
    save_path: PathBuf,
    fetch_generation: u64,
    /// Generation whose loading indicator is showing
    loading: Option<u64>,
    quality_popup: bool,
}

impl UiState {
    pub fn new(save_path: PathBuf) -> Self {
        Self {
            status: "Ready".to_string(),
            log: VecDeque::new(),
            progress: 0.0,
            downloading: false,
            catalog: Vec::new(),
            selected_quality: None,
            save_path,
            fetch_generation: 0,
            loading: None,
            quality_popup: false,
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn log(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter()
    }

    /// The log as one string, newest line first, each line newline-terminated
    pub fn log_text(&self) -> String {
        self.log.iter().map(|e| format!("{}\n", e.text)).collect()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    pub fn selected_quality(&self) -> Option<&str> {
        self.selected_quality.as_deref()
    }

    pub fn save_path(&self) -> &PathBuf {
        &self.save_path
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn quality_popup_open(&self) -> bool {
        self.quality_popup
    }

    pub fn append_log(&mut self, entry: LogEntry) {
        self.log.push_front(entry);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn set_progress(&mut self, ratio: f32) {
        self.progress = clamp_ratio(ratio);
    }

    pub fn set_downloading(&mut self, downloading: bool) {
        self.downloading = downloading;
    }

    /// Replaces the quality list; a non-empty list preselects its first entry
    pub fn set_format_catalog(&mut self, entries: Vec<String>) {
        self.selected_quality = entries.first().cloned();
        self.catalog = entries;
    }

    pub fn select_quality(&mut self, entry: &str) {
        if self.catalog.iter().any(|e| e == entry) {
            self.selected_quality = Some(entry.to_string());
        }
    }

    pub fn set_save_path(&mut self, path: PathBuf) {
        self.save_path = path;
    }

    pub fn close_quality_popup(&mut self) {
        self.quality_popup = false;
    }

    /// Starts a new fetch generation and shows the loading indicator for it
    pub fn begin_fetch(&mut self) -> u64 {
        self.fetch_generation += 1;
        self.loading = Some(self.fetch_generation);
        self.fetch_generation
    }

    pub fn begin_download(&mut self) {
        self.progress = 0.0;
        self.status = "Starting download...".to_string();
        self.downloading = true;
    }

    pub fn apply(&mut self, command: UiCommand) {
        match command {
            UiCommand::Log(entry) => self.append_log(entry),
            UiCommand::Status(status) => self.set_status(status),
            UiCommand::AdvanceProgress(ratio) => {
                self.progress = self.progress.max(clamp_ratio(ratio));
            }
            UiCommand::SetProgress(ratio) => self.set_progress(ratio),
            UiCommand::Catalog { generation, entries } => self.receive_catalog(generation, entries),
            UiCommand::FetchSettled { generation } => {
                if self.loading == Some(generation) {
                    self.loading = None;
                }
            }
            UiCommand::DownloadSettled => self.set_downloading(false),
        }
    }

    fn receive_catalog(&mut self, generation: u64, entries: Vec<String>) {
        if generation != self.fetch_generation {
            debug!(generation, latest = self.fetch_generation, "discarding stale format list");
            return;
        }
        if entries.is_empty() {
            self.append_log(LogEntry::error("No video formats found."));
            return;
        }
        self.set_format_catalog(entries);
        self.quality_popup = true;
        self.append_log(LogEntry::info("Available qualities fetched."));
    }
}

fn clamp_ratio(ratio: f32) -> f32 {
    if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> UiState {
        UiState::new(PathBuf::from("/downloads"))
    }

    #[test]
    fn log_is_newest_first() {
        let mut state = state();
        state.append_log(LogEntry::info("a"));
        state.append_log(LogEntry::error("b"));
        assert_eq!(state.log_text(), "b\na\n");
        assert_eq!(state.log().next(), Some(&LogEntry::error("b")));
    }

    #[test]
    fn progress_is_clamped() {
        let mut state = state();
        state.set_progress(1.7);
        assert_eq!(state.progress(), 1.0);
        state.set_progress(-0.3);
        assert_eq!(state.progress(), 0.0);
        state.set_progress(f32::NAN);
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn advancing_never_moves_backwards() {
        let mut state = state();
        state.begin_download();
        state.apply(UiCommand::AdvanceProgress(0.6));
        state.apply(UiCommand::AdvanceProgress(0.1));
        assert_eq!(state.progress(), 0.6);
        state.begin_download();
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn catalog_preselects_first_entry_and_opens_popup() {
        let mut state = state();
        let generation = state.begin_fetch();
        state.apply(UiCommand::Catalog { generation, entries: vec!["137 - 1080p - mp4".into(), "22 - 720p - mp4".into()] });
        state.apply(UiCommand::FetchSettled { generation });

        assert_eq!(state.selected_quality(), Some("137 - 1080p - mp4"));
        assert!(state.quality_popup_open());
        assert!(!state.is_loading());
        assert_eq!(state.log_text(), "Available qualities fetched.\n");
    }

    #[test]
    fn empty_catalog_keeps_previous_list() {
        let mut state = state();
        state.set_format_catalog(vec!["18 - 360p - mp4".into()]);
        let generation = state.begin_fetch();
        state.apply(UiCommand::Catalog { generation, entries: Vec::new() });

        assert_eq!(state.catalog(), ["18 - 360p - mp4"]);
        assert_eq!(state.log_text(), "No video formats found.\n");
        assert!(!state.quality_popup_open());
    }

    #[test]
    fn stale_fetch_results_are_discarded() {
        let mut state = state();
        let old = state.begin_fetch();
        let new = state.begin_fetch();

        state.apply(UiCommand::Catalog { generation: old, entries: vec!["1 - old".into()] });
        state.apply(UiCommand::FetchSettled { generation: old });
        assert!(state.catalog().is_empty());
        assert!(state.is_loading());

        state.apply(UiCommand::Catalog { generation: new, entries: vec!["2 - new".into()] });
        state.apply(UiCommand::FetchSettled { generation: new });
        assert_eq!(state.catalog(), ["2 - new"]);
        assert!(!state.is_loading());
    }

    #[test]
    fn selecting_unknown_entry_is_ignored() {
        let mut state = state();
        state.set_format_catalog(vec!["18 - 360p - mp4".into()]);
        state.select_quality("999 - bogus");
        assert_eq!(state.selected_quality(), Some("18 - 360p - mp4"));
    }
}
