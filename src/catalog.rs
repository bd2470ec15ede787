//! Turns the extractor's raw format listing into the quality list shown
//! in the selector, and maps a chosen entry back to a format selector.

use std::collections::HashSet;

use crate::model::RawFormat;

/// Text the quality selector shows when nothing is selected
pub const PLACEHOLDER: &str = "Select quality";

const SEPARATOR: &str = " - ";
const FALLBACK_SELECTOR: &str = "bestvideo+bestaudio/best";

/// Renders `{format_id} - {note} - {ext}` for a video-bearing format.
/// Returns `None` when the format carries no video stream.
pub fn display_label(format: &RawFormat) -> Option<String> {
    let vcodec = format.vcodec.as_deref().unwrap_or("");
    if vcodec.is_empty() || vcodec == "none" {
        return None;
    }

    let id = match format.format_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => fallback_id(format),
    };
    let note = match format.format_note.as_deref() {
        Some(note) if !note.is_empty() => note.to_string(),
        _ => match format.height {
            Some(h) if h > 0 => format!("{h}p"),
            _ => String::new(),
        },
    };
    let ext = format.ext.clone().unwrap_or_default();

    let parts: Vec<&str> = [id.as_str(), note.as_str(), ext.as_str()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    Some(parts.join(SEPARATOR))
}

fn fallback_id(format: &RawFormat) -> String {
    if let Some(tbr) = format.tbr.filter(|t| *t != 0.0) {
        return format!("{tbr:?}");
    }
    format
        .height
        .filter(|h| *h > 0)
        .or(format.width.filter(|w| *w > 0))
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// Video-only, order-preserving, deduplicated list of display labels
pub fn build_catalog(formats: &[RawFormat]) -> Vec<String> {
    let mut seen = HashSet::new();
    formats
        .iter()
        .filter_map(display_label)
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

/// Leading id token of a catalog entry
pub fn format_id_of(entry: &str) -> &str {
    entry.split(SEPARATOR).next().unwrap_or("").trim()
}

/// Format selector passed to the extractor for a chosen entry
pub fn format_selector_for(entry: &str) -> String {
    let token = format_id_of(entry);
    let numeric = !token.is_empty() && token.chars().all(|c| c.is_ascii_digit());
    if numeric || token.contains('+') || token.contains('/') {
        format!("{token}+bestaudio/best")
    } else {
        FALLBACK_SELECTOR.to_string()
    }
}
