//! The four analysis lanes.
//!
//! Each lane is a fetch routine plus a pure render function, and writes only
//! to its own [`Region`]:
//!
//! | Lane | Module | Endpoint | View model |
//! |------|--------|----------|------------|
//! | Word cloud | [`word_cloud`] | `POST /api/analysis/word-cloud` | [`WordCloudView`](word_cloud::WordCloudView) |
//! | Hot words | [`hot_words`] | `POST /api/analysis/hot-words` | [`HotWordsView`](hot_words::HotWordsView) |
//! | Time trend | [`time_trend`] | `POST /api/analysis/time-trend` | [`TrendChart`](time_trend::TrendChart) |
//! | Source distribution | [`source_distribution`] | `POST /api/analysis/source-distribution` | [`SourcePie`](source_distribution::SourcePie) |
//!
//! # Common Contract
//!
//! - Without a selected history a lane shows [`NO_SELECTION`] and sends nothing
//! - `Loading` is shown before the request is sent
//! - An empty payload is an empty state, never an error
//! - A failed request becomes an error state on that lane only; nothing is retried

use crate::api::FetchError;
use crate::outputs::PanelContent;
use crate::state::{Region, RegionState, Ticket};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub mod hot_words;
pub mod source_distribution;
pub mod time_trend;
pub mod word_cloud;

/// Prompt shown by every lane while no crawl history is selected.
pub const NO_SELECTION: &str = "select a crawl history record to analyze";

/// A term picked in the word cloud or the hot words list.
///
/// The session consumes it by making the term the trend keyword, reloading
/// the trend and revealing the trend panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermSelected {
    pub term: String,
}

/// Turn a failed request into the lane's error state.
pub(crate) fn failure_state<V>(what: &str, err: &FetchError) -> RegionState<V> {
    warn!(lane = what, error = %err, "Lane request failed");
    let message = match (err.server_message(), err) {
        (Some(server), _) => format!("failed to load {what} data: {server}"),
        (None, FetchError::Status { status, .. }) => {
            format!("failed to load {what} data: HTTP {status}")
        }
        (None, _) => format!("an error occurred while loading {what} data"),
    };
    RegionState::Error(message)
}

/// Await `fut`, filling the region with a placeholder if it is still loading
/// after `after`.
///
/// The request is not cancelled: its result still settles the region when it
/// arrives.
pub(crate) async fn with_watchdog<F, V>(
    fut: F,
    after: Option<Duration>,
    region: &Region<V>,
    ticket: Ticket,
    placeholder: impl FnOnce() -> RegionState<V>,
) -> F::Output
where
    F: Future,
    V: Clone + Into<PanelContent>,
{
    let Some(after) = after else {
        return fut.await;
    };

    tokio::pin!(fut);
    match tokio::time::timeout(after, &mut fut).await {
        Ok(output) => output,
        Err(_) => {
            if region.settle_if_loading(ticket, placeholder()) {
                warn!(
                    panel = %region.panel(),
                    after_ms = after.as_millis() as u64,
                    "Lane still loading; showing placeholder"
                );
            }
            fut.await
        }
    }
}
