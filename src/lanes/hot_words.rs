//! Hot words lane.
//!
//! The backend returns keywords already ranked by count. This lane numbers
//! them in the order received and never re-sorts.

use crate::api::AnalysisApi;
use crate::config::HotWordsVariant;
use crate::lanes::{NO_SELECTION, TermSelected, failure_state};
use crate::models::{AnalysisSelection, HotWordEntry, HotWordsRequest};
use crate::state::{Region, RegionState};
use serde::Serialize;
use tracing::{info, instrument};

pub const EMPTY_MESSAGE: &str = "insufficient data for hot words ranking";

/// Bar colors of the chart variant, cycled by row index.
const BAR_PALETTE: [&str; 10] = [
    "#c23531", "#2f4554", "#61a0a8", "#d48265", "#91c7ae", "#749f83", "#ca8622", "#bda29a",
    "#6e7074", "#546570",
];

/// Emphasis given to the top three ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    fn for_rank(rank: usize) -> Option<Medal> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotWordRow {
    pub rank: usize,
    pub word: String,
    pub count: u64,
    pub medal: Option<Medal>,
    pub bar_color: Option<String>,
}

impl HotWordRow {
    pub fn select(&self) -> TermSelected {
        TermSelected {
            term: self.word.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotWordsView {
    pub variant: HotWordsVariant,
    pub rows: Vec<HotWordRow>,
}

impl HotWordsView {
    pub fn row(&self, rank: usize) -> Option<&HotWordRow> {
        self.rows.iter().find(|r| r.rank == rank)
    }
}

/// Number `entries` 1..N as given, then keep at most `cap` rows.
///
/// # Returns
///
/// The ranking in received order. Ranks 1 to 3 carry a medal, and the chart
/// variant gives every row a bar color.
pub fn render_hot_words(
    entries: &[HotWordEntry],
    variant: HotWordsVariant,
    cap: usize,
) -> HotWordsView {
    let rows = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let rank = index + 1;
            HotWordRow {
                rank,
                word: entry.word.clone(),
                count: entry.count,
                medal: Medal::for_rank(rank),
                bar_color: match variant {
                    HotWordsVariant::Chart => {
                        Some(BAR_PALETTE[index % BAR_PALETTE.len()].to_string())
                    }
                    HotWordsVariant::List => None,
                },
            }
        })
        .take(cap)
        .collect();

    HotWordsView { variant, rows }
}

/// Load and render the hot words ranking for `selection`.
///
/// # Arguments
///
/// * `limit` - How many words to ask the backend for
/// * `cap` - How many rows the view keeps
#[instrument(level = "info", skip_all, fields(history_id = ?selection.history_id, limit = limit))]
pub async fn load_hot_words<A: AnalysisApi>(
    api: &A,
    selection: &AnalysisSelection,
    limit: usize,
    variant: HotWordsVariant,
    cap: usize,
    region: &Region<HotWordsView>,
) {
    let Some(history_id) = selection.history_id else {
        region.present(RegionState::Empty(NO_SELECTION.to_string()));
        return;
    };

    let ticket = region.begin();
    let request = HotWordsRequest { history_id, limit };

    let state = match api.hot_words(&request).await {
        Ok(response) => {
            let entries = response.hot_words.unwrap_or_default();
            info!(count = entries.len(), total = ?response.total, "Hot words loaded");
            if entries.is_empty() {
                RegionState::Empty(EMPTY_MESSAGE.to_string())
            } else {
                RegionState::Populated(render_hot_words(&entries, variant, cap))
            }
        }
        Err(e) => failure_state("hot words", &e),
    };
    region.settle(ticket, state);
}
