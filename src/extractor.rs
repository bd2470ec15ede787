use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};
use tracing::{debug, info, warn};

use crate::error::{DownloadError, ExtractionError};
use crate::model::{DownloadRequest, ProgressEvent, RawFormat, VideoInfo};
use crate::progress::{parse_progress_from_line, progress_template};

/// The video-extraction backend. Everything about sites, formats,
/// transport and muxing lives behind this trait.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Lists the stream variants of `url` without downloading anything
    async fn list_formats(&self, url: &str) -> Result<Vec<RawFormat>, ExtractionError>;

    /// Downloads and post-processes; returns the extractor's exit code
    async fn download(
        &self,
        request: &DownloadRequest,
        on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<i32, DownloadError>;
}

/// Drives the `yt-dlp` executable
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    fn download_args(request: &DownloadRequest) -> Vec<String> {
        vec![
            "-f".to_owned(),
            request.format_selector.clone(),
            "--merge-output-format".to_owned(),
            request.merge_container.to_owned(),
            "--recode-video".to_owned(),
            request.merge_container.to_owned(),
            "--no-playlist".to_owned(),
            "--no-warnings".to_owned(),
            "--newline".to_owned(),
            "--progress-template".to_owned(),
            progress_template(),
            "-o".to_owned(),
            request.output_template.display().to_string(),
            "--".to_owned(),
            request.url.clone(),
        ]
    }
}

/// Splits raw output into lines; undecodable bytes never end the stream
async fn for_each_line(reader: impl AsyncRead + Unpin, mut f: impl FnMut(&str)) -> std::io::Result<()> {
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Some(segment) = segments.next_segment().await? {
        f(&String::from_utf8_lossy(&segment));
    }
    Ok(())
}

#[async_trait]
impl Extractor for YtDlp {
    async fn list_formats(&self, url: &str) -> Result<Vec<RawFormat>, ExtractionError> {
        let output = Command::new(&self.program)
            .args(["-J", "--no-warnings", "--no-playlist", "--", url])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(ExtractionError::Launch)?;

        if !output.status.success() {
            return Err(ExtractionError::Exit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        debug!(title = info.title.as_deref().unwrap_or("?"), formats = info.formats.len(), "listed formats");
        if info.formats.is_empty() {
            return Err(ExtractionError::NoFormats);
        }
        Ok(info.formats)
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<i32, DownloadError> {
        info!(url = %request.url, format = %request.format_selector, "starting yt-dlp download");
        let mut child = Command::new(&self.program)
            .args(Self::download_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(DownloadError::Launch)?;

        // Drain stderr so the child never blocks on a full pipe
        let stderr = child.stderr.take().map(|err| {
            tokio::spawn(async move {
                let _ = for_each_line(err, |line| debug!(target: "video_downloader::yt_dlp", "{line}")).await;
            })
        });

        if let Some(out) = child.stdout.take() {
            let relayed = for_each_line(out, |line| {
                if let Some(event) = parse_progress_from_line(line) {
                    on_progress(event);
                }
            })
            .await;
            if let Err(err) = relayed {
                warn!(error = %err, "lost yt-dlp output, stopping it");
                let _ = child.kill().await;
                return Err(DownloadError::Io(err));
            }
        }

        let status = child.wait().await.map_err(DownloadError::Io)?;
        if let Some(task) = stderr {
            let _ = task.await;
        }
        let code = status.code().unwrap_or(-1);
        info!(code, "yt-dlp finished");
        Ok(code)
    }
}
