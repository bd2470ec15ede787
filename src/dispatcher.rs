//! One-way hand-off from worker tasks to the UI thread.
//!
//! Workers hold a [`Dispatcher`] and only ever *request* state changes.
//! The UI thread owns the [`MainThreadQueue`] and replays the requests,
//! in the order they were posted, before rendering each frame.

use eframe::egui;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::trace;

use crate::model::LogEntry;
use crate::state::UiState;

/// A state mutation requested from a worker
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    Log(LogEntry),
    Status(String),
    /// Raises the progress ratio of the running download
    AdvanceProgress(f32),
    SetProgress(f32),
    Catalog { generation: u64, entries: Vec<String> },
    /// A fetch task ended, successfully or not
    FetchSettled { generation: u64 },
    /// The download task ended; always the last command it posts
    DownloadSettled,
}

#[derive(Clone)]
pub struct Dispatcher {
    tx: UnboundedSender<UiCommand>,
    repaint: Option<egui::Context>,
}

impl Dispatcher {
    /// Wake the UI whenever a command is posted
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn post(&self, command: UiCommand) {
        if self.tx.send(command).is_err() {
            trace!("UI queue closed, dropping command");
            return;
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }

    pub fn log(&self, entry: LogEntry) {
        self.post(UiCommand::Log(entry));
    }

    pub fn status(&self, status: impl Into<String>) {
        self.post(UiCommand::Status(status.into()));
    }
}

pub struct MainThreadQueue {
    rx: UnboundedReceiver<UiCommand>,
}

impl MainThreadQueue {
    pub fn try_next(&mut self) -> Option<UiCommand> {
        self.rx.try_recv().ok()
    }

    /// Applies every pending command to `state`; returns how many ran
    pub fn pump(&mut self, state: &mut UiState) -> usize {
        let mut applied = 0;
        while let Some(command) = self.try_next() {
            state.apply(command);
            applied += 1;
        }
        applied
    }
}

pub fn channel() -> (Dispatcher, MainThreadQueue) {
    let (tx, rx) = unbounded_channel();
    (Dispatcher { tx, repaint: None }, MainThreadQueue { rx })
}
