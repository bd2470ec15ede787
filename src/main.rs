//! Desktop video downloader: paste a URL, pick a quality, download to a folder

// User intents and validation
mod app;
// Format list construction and selector derivation
mod catalog;
// Environment-driven settings
mod config;
// Directory chooser popup model
mod dir_chooser;
// Worker-to-UI command queue
mod dispatcher;
// Error taxonomy
mod error;
// yt-dlp integration
mod extractor;
// tracing setup
mod logging;
// Plain data types shared across modules
mod model;
// Progress line parsing utilities
mod progress;
// Observable UI state
mod state;
// Background fetch and download tasks
mod tasks;
// egui rendering
mod ui;

use std::sync::Arc;

use eframe::egui::{self, Visuals};
use once_cell::sync::OnceCell;
use tokio::runtime::Runtime;
use tracing::info;

use app::DownloaderApp;
use config::AppConfig;
use error::StartupError;
use extractor::YtDlp;
use tasks::TaskRunner;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Program entry point: initializes logging and the runtime, then launches the GUI
fn main() -> Result<(), StartupError> {
    logging::init_tracing();

    let config = AppConfig::from_env();
    info!(ytdlp = %config.ytdlp_program.display(), dir = %config.download_dir.display(), "starting");

    let handle = RUNTIME.get_or_try_init(Runtime::new)?.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([720.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Video Downloader",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());

            let (dispatcher, queue) = dispatcher::channel();
            let dispatcher = dispatcher.with_repaint(cc.egui_ctx.clone());
            let extractor = Arc::new(YtDlp::new(config.ytdlp_program));
            let runner = TaskRunner::new(extractor, handle, dispatcher);
            Box::new(DownloaderApp::new(runner, queue, config.download_dir))
        }),
    )?;
    Ok(())
}
