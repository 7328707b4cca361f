//! Small helpers for string shortening, selection parsing and output directories.
//!
//! - [`truncate_for_log`]: keep response bodies short in log lines
//! - [`truncate_label`]: shorten legend labels by characters, not bytes
//! - [`history_id_from_url`]: read `historyId` from a page URL
//! - [`ensure_writable_dir`]: validate the snapshot output directory

use crate::models::HistoryId;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with a
/// `"…(+N bytes)"` suffix.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Shorten `s` to `max` characters followed by `...` when it is longer.
pub fn truncate_label(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}...")
    }
}

/// Read the `historyId` query parameter of a page URL.
///
/// Returns `None` if the URL does not parse, has no such parameter, or the
/// value is not an integer.
pub fn history_id_from_url(page_url: &str) -> Option<HistoryId> {
    let url = match Url::parse(page_url) {
        Ok(url) => url,
        Err(e) => {
            warn!(page_url, error = %e, "Could not parse page URL");
            return None;
        }
    };
    url.query_pairs()
        .find(|(key, _)| key == "historyId")
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
