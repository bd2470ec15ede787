//! Background units of work. Each task runs on the shared tokio runtime,
//! reports back only through the [`Dispatcher`], and always posts its
//! settlement command last, even when the body fails or panics.

use std::sync::Arc;

use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{error, info, warn};

use crate::catalog::build_catalog;
use crate::dispatcher::{Dispatcher, UiCommand};
use crate::error::{DownloadError, ExtractionError};
use crate::extractor::Extractor;
use crate::model::{DownloadTarget, LogEntry, ProgressEvent, ProgressPhase};
use crate::progress::progress_update;

/// Posts its command when dropped, whatever path the task took
struct SettleOnDrop {
    dispatcher: Dispatcher,
    command: Option<UiCommand>,
}

impl SettleOnDrop {
    fn new(dispatcher: Dispatcher, command: UiCommand) -> Self {
        Self { dispatcher, command: Some(command) }
    }
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        if let Some(command) = self.command.take() {
            self.dispatcher.post(command);
        }
    }
}

#[derive(Clone)]
pub struct TaskRunner {
    extractor: Arc<dyn Extractor>,
    handle: Handle,
    dispatcher: Dispatcher,
}

impl TaskRunner {
    pub fn new(extractor: Arc<dyn Extractor>, handle: Handle, dispatcher: Dispatcher) -> Self {
        Self { extractor, handle, dispatcher }
    }

    pub fn spawn_fetch(&self, url: String, generation: u64) -> JoinHandle<()> {
        let extractor = Arc::clone(&self.extractor);
        let dispatcher = self.dispatcher.clone();
        let handle = self.handle.clone();

        self.handle.spawn(async move {
            let _settle = SettleOnDrop::new(dispatcher.clone(), UiCommand::FetchSettled { generation });

            let body = handle.spawn(async move { extractor.list_formats(&url).await });
            let listed = body
                .await
                .unwrap_or_else(|join| Err(ExtractionError::Aborted(join.to_string())));

            match listed {
                Ok(formats) => {
                    let entries = build_catalog(&formats);
                    info!(generation, qualities = entries.len(), "fetched formats");
                    dispatcher.post(UiCommand::Catalog { generation, entries });
                }
                Err(err) => {
                    warn!(generation, error = %err, "format listing failed");
                    dispatcher.log(LogEntry::error(err.user_message()));
                }
            }
        })
    }

    pub fn spawn_download(&self, target: DownloadTarget) -> JoinHandle<()> {
        let extractor = Arc::clone(&self.extractor);
        let dispatcher = self.dispatcher.clone();
        let handle = self.handle.clone();

        self.handle.spawn(async move {
            let _settle = SettleOnDrop::new(dispatcher.clone(), UiCommand::DownloadSettled);

            let body = handle.spawn(run_download(extractor, dispatcher.clone(), target));
            let outcome = body
                .await
                .unwrap_or_else(|join| Err(DownloadError::Aborted(join.to_string())));
            report_download(&dispatcher, outcome);
        })
    }
}

async fn run_download(
    extractor: Arc<dyn Extractor>,
    dispatcher: Dispatcher,
    target: DownloadTarget,
) -> Result<i32, DownloadError> {
    let on_progress = move |event: ProgressEvent| match event.phase {
        ProgressPhase::Downloading => {
            let update = progress_update(&event);
            if let Some(ratio) = update.ratio {
                dispatcher.post(UiCommand::AdvanceProgress(ratio));
            }
            dispatcher.status(update.status);
        }
        ProgressPhase::Finished => {
            dispatcher.log(LogEntry::emphasis("Download finished (processing)..."));
        }
    };
    extractor.download(&target.request(), &on_progress).await
}

fn report_download(dispatcher: &Dispatcher, outcome: Result<i32, DownloadError>) {
    let failure = match outcome {
        Ok(0) => {
            info!("download completed");
            dispatcher.log(LogEntry::success("Download completed successfully."));
            dispatcher.status("Completed");
            dispatcher.post(UiCommand::SetProgress(1.0));
            return;
        }
        Ok(code) => DownloadError::Exit(code),
        Err(err) => err,
    };
    error!(error = %failure, "download failed");
    dispatcher.log(LogEntry::error(failure.user_message()));
    dispatcher.status("Error");
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{io, path::PathBuf, sync::Mutex};

    use async_trait::async_trait;
    use tokio::runtime::Runtime;

    use super::*;
    use crate::dispatcher::{MainThreadQueue, channel};
    use crate::model::{DownloadRequest, RawFormat};
    use crate::state::UiState;

    pub(crate) enum Finish {
        Code(i32),
        Fail,
        Panic,
    }

    /// Scripted extractor that records the download requests it receives
    pub(crate) struct FakeExtractor {
        pub formats: Option<Vec<RawFormat>>,
        pub events: Vec<ProgressEvent>,
        pub finish: Finish,
        pub requests: Mutex<Vec<DownloadRequest>>,
    }

    impl FakeExtractor {
        pub fn new(formats: Option<Vec<RawFormat>>, events: Vec<ProgressEvent>, finish: Finish) -> Self {
            Self { formats, events, finish, requests: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl Extractor for FakeExtractor {
        async fn list_formats(&self, _url: &str) -> Result<Vec<RawFormat>, ExtractionError> {
            self.formats.clone().ok_or(ExtractionError::Exit { code: 1, stderr: "ERROR: boom".into() })
        }

        async fn download(
            &self,
            request: &DownloadRequest,
            on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
        ) -> Result<i32, DownloadError> {
            self.requests.lock().unwrap().push(request.clone());
            for event in &self.events {
                on_progress(*event);
            }
            match self.finish {
                Finish::Code(code) => Ok(code),
                Finish::Fail => Err(DownloadError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))),
                Finish::Panic => panic!("extractor blew up"),
            }
        }
    }

    fn setup(fake: FakeExtractor) -> (Runtime, TaskRunner, MainThreadQueue, UiState) {
        let rt = Runtime::new().unwrap();
        let (dispatcher, queue) = channel();
        let runner = TaskRunner::new(Arc::new(fake), rt.handle().clone(), dispatcher);
        (rt, runner, queue, UiState::new(PathBuf::from("/downloads")))
    }

    fn target() -> DownloadTarget {
        DownloadTarget {
            source_url: "https://example.com/v".into(),
            format_selector: "137+bestaudio/best".into(),
            output_directory: PathBuf::from("/downloads"),
        }
    }

    fn event(phase: ProgressPhase, downloaded: u64, total: u64) -> ProgressEvent {
        ProgressEvent { phase, downloaded_bytes: downloaded, total_bytes: total }
    }

    #[test]
    fn fetch_posts_filtered_catalog_then_settles() {
        let formats = vec![
            RawFormat {
                format_id: Some("137".into()),
                vcodec: Some("avc1".into()),
                format_note: Some("1080p".into()),
                ext: Some("mp4".into()),
                ..Default::default()
            },
            RawFormat { format_id: Some("140".into()), vcodec: Some("none".into()), ..Default::default() },
        ];
        let (rt, runner, mut queue, mut state) = setup(FakeExtractor::new(Some(formats), vec![], Finish::Code(0)));

        let generation = state.begin_fetch();
        rt.block_on(runner.spawn_fetch("https://example.com/v".into(), generation)).unwrap();
        queue.pump(&mut state);

        assert_eq!(state.catalog(), ["137 - 1080p - mp4"]);
        assert!(!state.is_loading());
    }

    #[test]
    fn fetch_failure_logs_one_generic_line() {
        let (rt, runner, mut queue, mut state) = setup(FakeExtractor::new(None, vec![], Finish::Code(0)));

        let generation = state.begin_fetch();
        rt.block_on(runner.spawn_fetch("https://example.com/v".into(), generation)).unwrap();
        queue.pump(&mut state);

        assert_eq!(state.log_text(), "Failed to fetch qualities. Check URL or connection.\n");
        assert!(state.catalog().is_empty());
        assert!(!state.is_loading());
    }

    #[test]
    fn download_success_reports_progress_and_completes() {
        let events = vec![
            event(ProgressPhase::Downloading, 50, 200),
            event(ProgressPhase::Downloading, 80, 0),
            event(ProgressPhase::Finished, 200, 200),
        ];
        let (rt, runner, mut queue, mut state) = setup(FakeExtractor::new(None, events, Finish::Code(0)));

        state.begin_download();
        rt.block_on(runner.spawn_download(target())).unwrap();
        queue.pump(&mut state);

        assert_eq!(state.status(), "Completed");
        assert_eq!(state.progress(), 1.0);
        assert!(!state.is_downloading());
        assert_eq!(state.log_text(), "Download completed successfully.\nDownload finished (processing)...\n");
    }

    #[test]
    fn progress_commands_follow_event_order() {
        let events = vec![event(ProgressPhase::Downloading, 50, 200), event(ProgressPhase::Downloading, 60, 0)];
        let (rt, runner, mut queue, _) = setup(FakeExtractor::new(None, events, Finish::Code(0)));
        rt.block_on(runner.spawn_download(target())).unwrap();

        let mut commands = Vec::new();
        while let Some(command) = queue.try_next() {
            commands.push(command);
        }

        assert_eq!(commands[0], UiCommand::AdvanceProgress(0.25));
        assert_eq!(commands[1], UiCommand::Status("25% - downloading".into()));
        assert_eq!(commands[2], UiCommand::Status("downloading".into()));
        assert_eq!(commands.last(), Some(&UiCommand::DownloadSettled));
    }

    #[test]
    fn task_downloads_the_snapshot_it_was_given() {
        let fake = Arc::new(FakeExtractor::new(None, vec![], Finish::Code(0)));
        let rt = Runtime::new().unwrap();
        let (dispatcher, _queue) = channel();
        let runner = TaskRunner::new(fake.clone(), rt.handle().clone(), dispatcher);

        rt.block_on(runner.spawn_download(target())).unwrap();

        let requests = fake.requests.lock().unwrap();
        assert_eq!(requests.as_slice(), [target().request()]);
    }

    #[test]
    fn download_error_is_reported_generically() {
        let (rt, runner, mut queue, mut state) = setup(FakeExtractor::new(None, vec![], Finish::Fail));

        state.begin_download();
        rt.block_on(runner.spawn_download(target())).unwrap();
        queue.pump(&mut state);

        assert_eq!(state.log_text(), "Download failed. Check URL or connection.\n");
        assert_eq!(state.status(), "Error");
        assert!(!state.is_downloading());
    }

    #[test]
    fn non_zero_exit_is_a_failure() {
        let (rt, runner, mut queue, mut state) = setup(FakeExtractor::new(None, vec![], Finish::Code(1)));

        state.begin_download();
        rt.block_on(runner.spawn_download(target())).unwrap();
        queue.pump(&mut state);

        assert_eq!(state.status(), "Error");
        assert!(!state.is_downloading());
    }

    #[test]
    fn panicking_extractor_still_clears_downloading_once() {
        let (rt, runner, mut queue, mut state) = setup(FakeExtractor::new(None, vec![], Finish::Panic));

        state.begin_download();
        rt.block_on(runner.spawn_download(target())).unwrap();

        let mut settled = 0;
        while let Some(command) = queue.try_next() {
            if command == UiCommand::DownloadSettled {
                settled += 1;
            }
            state.apply(command);
        }

        assert_eq!(settled, 1);
        assert_eq!(state.status(), "Error");
        assert!(!state.is_downloading());
        assert!(!state.log_text().contains("blew up"));
    }
}
