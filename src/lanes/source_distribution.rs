//! Source distribution lane.
//!
//! Shows which news sources the articles of a crawl came from, as a pie.
//!
//! # Fallback Chain
//!
//! The endpoint has answered in several shapes over time and is not always
//! available, so the counts are resolved in order:
//!
//! 1. `POST /api/analysis/source-distribution`, normalized through
//!    [`SourceDistributionPayload`]
//! 2. `GET /api/history/{historyId}/news`, tallying each article's `source`
//! 3. The fixed [`PLACEHOLDER_SOURCES`] (unless disabled in the config)
//!
//! A step is skipped to the next one when it fails or yields no counts.

use crate::api::{AnalysisApi, FetchError};
use crate::config::{SourceDistributionConfig, SourceVariant};
use crate::lanes::{NO_SELECTION, failure_state, with_watchdog};
use crate::models::{
    AnalysisSelection, HistoryId, NewsRecord, SourceCount, SourceDistributionRequest,
};
use crate::state::{Region, RegionState};
use crate::utils::truncate_label;
use itertools::Itertools;
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{info, instrument, warn};

pub const EMPTY_MESSAGE: &str = "insufficient data for source distribution";

const SERIES_NAME: &str = "news sources";

const PALETTE: [&str; 9] = [
    "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452", "#9a60b4",
    "#ea7ccc",
];

/// Shown when no real distribution can be obtained.
pub static PLACEHOLDER_SOURCES: Lazy<Vec<SourceCount>> = Lazy::new(|| {
    vec![
        SourceCount::new("新浪新闻", 42),
        SourceCount::new("人民日报", 28),
        SourceCount::new("央视网", 16),
        SourceCount::new("环球时报", 9),
        SourceCount::new("中国日报", 5),
    ]
});

/// Where the displayed counts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionOrigin {
    Endpoint,
    Articles,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSlice {
    pub name: String,
    /// Legend text, shortened for long source names.
    pub label: String,
    pub value: u64,
    /// Share of the displayed slices, 0–100.
    pub percent: f64,
    pub color: String,
}

impl SourceSlice {
    pub fn tooltip(&self) -> String {
        format!("{}: {} ({:.1}%)", self.name, self.value, self.percent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcePie {
    pub title: String,
    pub series_name: String,
    pub slices: Vec<SourceSlice>,
    pub scrolling_legend: bool,
    pub origin: DistributionOrigin,
}

/// Count articles per source in first-seen order. Articles without a source
/// are skipped.
pub fn tally_sources(records: &[NewsRecord]) -> Vec<SourceCount> {
    let sources: Vec<&str> = records
        .iter()
        .filter_map(|r| r.source.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let counts = sources.iter().counts();
    sources
        .iter()
        .unique()
        .map(|source| SourceCount::new(*source, counts[source] as u64))
        .collect()
}

/// Sort `counts` by count, largest first, and build the pie.
///
/// Ties keep their input order. The compact variant keeps only the top
/// `config.top_n` slices; percentages are relative to what is displayed.
pub fn render_source_distribution(
    counts: &[SourceCount],
    config: &SourceDistributionConfig,
    origin: DistributionOrigin,
) -> SourcePie {
    let keep = match config.variant {
        SourceVariant::Compact => config.top_n,
        SourceVariant::Full => counts.len(),
    };
    let shown: Vec<&SourceCount> = counts
        .iter()
        .sorted_by(|a, b| b.count.cmp(&a.count))
        .take(keep)
        .collect();
    let total: u64 = shown.iter().map(|c| c.count).sum();

    let slices = shown
        .iter()
        .enumerate()
        .map(|(index, c)| SourceSlice {
            name: c.source.clone(),
            label: truncate_label(&c.source, config.legend_max_chars),
            value: c.count,
            percent: if total > 0 {
                c.count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            color: PALETTE[index % PALETTE.len()].to_string(),
        })
        .collect();

    let (title, scrolling_legend) = match config.variant {
        SourceVariant::Compact => (format!("top {} news sources", config.top_n), false),
        SourceVariant::Full => ("Source distribution".to_string(), true),
    };

    SourcePie {
        title,
        series_name: SERIES_NAME.to_string(),
        slices,
        scrolling_legend,
        origin,
    }
}

fn placeholder_pie(config: &SourceDistributionConfig) -> SourcePie {
    render_source_distribution(&PLACEHOLDER_SOURCES, config, DistributionOrigin::Placeholder)
}

/// Walk the fallback chain for `history_id`.
async fn resolve<A: AnalysisApi>(
    api: &A,
    history_id: HistoryId,
    config: &SourceDistributionConfig,
) -> RegionState<SourcePie> {
    let endpoint_failure: Option<FetchError> =
        match api.source_distribution(&SourceDistributionRequest { history_id }).await {
            Ok(payload) => {
                let shape = payload.shape();
                let counts = payload.into_canonical();
                if !counts.is_empty() {
                    info!(shape, sources = counts.len(), "Source distribution loaded");
                    return RegionState::Populated(render_source_distribution(
                        &counts,
                        config,
                        DistributionOrigin::Endpoint,
                    ));
                }
                info!(shape, "Source distribution endpoint returned no usable entries");
                None
            }
            Err(e) => {
                warn!(error = %e, "Source distribution endpoint failed; tallying articles");
                Some(e)
            }
        };

    match api.history_news(history_id).await {
        Ok(records) => {
            let counts = tally_sources(&records);
            if !counts.is_empty() {
                info!(
                    articles = records.len(),
                    sources = counts.len(),
                    "Source distribution tallied from articles"
                );
                return RegionState::Populated(render_source_distribution(
                    &counts,
                    config,
                    DistributionOrigin::Articles,
                ));
            }
        }
        Err(e) => warn!(error = %e, "Could not load articles for source tally"),
    }

    if config.placeholder_on_failure {
        warn!("No source data available; showing placeholder distribution");
        return RegionState::Populated(placeholder_pie(config));
    }
    match endpoint_failure {
        Some(e) => failure_state("source distribution", &e),
        None => RegionState::Empty(EMPTY_MESSAGE.to_string()),
    }
}

/// Load and render the source distribution for `selection`.
///
/// # Arguments
///
/// * `api` - Backend to query
/// * `selection` - The selected crawl history, if any
/// * `config` - Variant, top-N, legend width, watchdog and placeholder settings
/// * `region` - The source distribution region; every state change lands here
///
/// A slow load shows the placeholder after the configured delay; the real
/// result still replaces it. Strict mode keeps `Loading` until it settles.
#[instrument(
    level = "info",
    skip_all,
    fields(history_id = ?selection.history_id, variant = ?config.variant)
)]
pub async fn load_source_distribution<A: AnalysisApi>(
    api: &A,
    selection: &AnalysisSelection,
    config: &SourceDistributionConfig,
    region: &Region<SourcePie>,
) {
    let Some(history_id) = selection.history_id else {
        region.present(RegionState::Empty(NO_SELECTION.to_string()));
        return;
    };

    let ticket = region.begin();
    let state = with_watchdog(
        resolve(api, history_id, config),
        config.watchdog(),
        region,
        ticket,
        || RegionState::Populated(placeholder_pie(config)),
    )
    .await;
    region.settle(ticket, state);
}
