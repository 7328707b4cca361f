//! Display adapters for the analysis panels.
//!
//! Lanes never draw anything themselves. They produce view models, store them
//! in their [`Region`](crate::state::Region), and every state change is
//! committed in full to a [`Surface`].
//!
//! # Submodules
//!
//! - [`terminal`]: Draws panels as text on stdout
//! - [`json`]: Writes a snapshot of all panels to a JSON file
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 42/                          # history id
//!     └── 2025-05-06_201530.json   # one snapshot per `save`
//! ```

use crate::lanes::hot_words::HotWordsView;
use crate::lanes::source_distribution::SourcePie;
use crate::lanes::time_trend::TrendChart;
use crate::lanes::word_cloud::WordCloudView;
use crate::state::RegionState;
use serde::Serialize;
use std::fmt;

pub mod json;
pub mod terminal;

/// The four display regions, one per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    WordCloud,
    HotWords,
    TimeTrend,
    SourceDistribution,
}

impl Panel {
    #[cfg(test)]
    pub const ALL: [Panel; 4] = [
        Panel::WordCloud,
        Panel::HotWords,
        Panel::TimeTrend,
        Panel::SourceDistribution,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Panel::WordCloud => "Word cloud",
            Panel::HotWords => "Hot words",
            Panel::TimeTrend => "Keyword time trend",
            Panel::SourceDistribution => "Source distribution",
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A populated panel's view model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelContent {
    WordCloud(WordCloudView),
    HotWords(HotWordsView),
    TimeTrend(TrendChart),
    SourceDistribution(SourcePie),
}

impl From<WordCloudView> for PanelContent {
    fn from(view: WordCloudView) -> Self {
        PanelContent::WordCloud(view)
    }
}

impl From<HotWordsView> for PanelContent {
    fn from(view: HotWordsView) -> Self {
        PanelContent::HotWords(view)
    }
}

impl From<TrendChart> for PanelContent {
    fn from(chart: TrendChart) -> Self {
        PanelContent::TimeTrend(chart)
    }
}

impl From<SourcePie> for PanelContent {
    fn from(pie: SourcePie) -> Self {
        PanelContent::SourceDistribution(pie)
    }
}

/// What a surface is asked to show for one panel.
pub type PanelView = RegionState<PanelContent>;

/// A UI target the panels are committed to.
pub trait Surface: Send + Sync {
    /// Replace everything shown for `panel` with `view`.
    fn commit(&self, panel: Panel, view: &PanelView);

    /// Bring `panel` into view.
    fn reveal(&self, panel: Panel);
}
