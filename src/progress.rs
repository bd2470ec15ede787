use crate::model::{ProgressEvent, ProgressPhase};

/// Marker yt-dlp prints in front of every progress line we ask it for
pub const PROGRESS_PREFIX: &str = "vdl-progress";

/// Value for yt-dlp's `--progress-template`
pub fn progress_template() -> String {
    format!(
        "download:{PROGRESS_PREFIX} %(progress.status)s %(progress.downloaded_bytes)s \
         %(progress.total_bytes)s %(progress.total_bytes_estimate)s"
    )
}

pub fn parse_progress_from_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split_whitespace();

    let phase = match fields.next()? {
        "downloading" => ProgressPhase::Downloading,
        "finished" => ProgressPhase::Finished,
        _ => return None,
    };
    let downloaded_bytes = fields.next().and_then(parse_bytes).unwrap_or(0);
    let total = fields.next().and_then(parse_bytes);
    let estimate = fields.next().and_then(parse_bytes);

    Some(ProgressEvent {
        phase,
        downloaded_bytes,
        total_bytes: total.filter(|t| *t > 0).or(estimate).unwrap_or(0),
    })
}

// yt-dlp prints "NA" for unknown values and floats for estimates
fn parse_bytes(field: &str) -> Option<u64> {
    let value: f64 = field.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value as u64)
}

/// What a "downloading" event does to the progress bar and status line
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// `None` when the total size is unknown; the bar stays where it is
    pub ratio: Option<f32>,
    pub status: String,
}

pub fn progress_update(event: &ProgressEvent) -> ProgressUpdate {
    let tag = event.phase.as_str();
    if event.total_bytes == 0 {
        return ProgressUpdate { ratio: None, status: tag.to_string() };
    }
    let ratio = (event.downloaded_bytes as f64 / event.total_bytes as f64).clamp(0.0, 1.0);
    ProgressUpdate {
        ratio: Some(ratio as f32),
        status: format!("{}% - {tag}", (ratio * 100.0) as u32),
    }
}
