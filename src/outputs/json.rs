//! JSON snapshots of the analysis panels.
//!
//! A snapshot holds the selection, the trend query and the full state of all
//! four panels, serialized exactly as the terminal received them.
//!
//! # Output Path
//!
//! `{json_output_dir}/{historyId}/{local_date}_{local_time}.json`, with
//! `none` in place of the history id when nothing is selected.

use crate::session::AnalysisSnapshot;
use crate::utils::ensure_writable_dir;
use chrono::Local;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `snapshot` below `json_output_dir` and return the file path.
///
/// # Arguments
///
/// * `snapshot` - Every panel as currently shown
/// * `json_output_dir` - Base directory for snapshots
///
/// # Returns
///
/// The path of the written file, or an error if serialization, directory
/// creation or the write fails.
///
/// # Output Path
///
/// `{json_output_dir}/{historyId}/{date}_{time}.json`, with `none` in place
/// of the history id when nothing is selected.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_snapshot(
    snapshot: &AnalysisSnapshot,
    json_output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(snapshot)?;

    let history_dir = match snapshot.selection.history_id {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    };
    let full_json_dir = json_output_dir.join(history_dir);
    if let Err(e) = ensure_writable_dir(&full_json_dir).await {
        error!(dir = %full_json_dir.display(), error = %e, "Failed to prepare JSON dir");
        return Err(e);
    }

    let now = Local::now();
    let path = full_json_dir.join(format!(
        "{}_{}.json",
        now.format("%Y-%m-%d"),
        now.format("%H%M%S")
    ));

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote analysis snapshot");
    Ok(path)
}
