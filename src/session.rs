//! The analysis session: selection, trend query state and the four regions.
//!
//! [`AnalysisSession`] is the entry point the host drives. It owns the
//! current [`AnalysisSelection`], the trend keyword and time unit, and one
//! [`Region`] per lane. Query state only changes through `&mut self`
//! methods; the lanes receive it as plain arguments.
//!
//! # Flow
//!
//! 1. [`begin_analysis`](AnalysisSession::begin_analysis) sets the selection,
//!    resets the keyword and fires all four lanes concurrently
//! 2. Selecting a word cloud term or a hot words row turns into a
//!    [`TermSelected`] event, which re-queries the trend with that term
//! 3. Changing the time unit re-queries the trend right away
//!
//! # Lane Tasks
//!
//! Methods that trigger a load apply their state change at once and return a
//! [`LaneTask`]. The task owns what it needs, so the host keeps taking
//! commands while it runs. Overlapping tasks on one region are settled by the
//! region's ticket guard.

use crate::api::AnalysisApi;
use crate::config::AnalysisConfig;
use crate::lanes::hot_words::{HotWordsView, load_hot_words};
use crate::lanes::source_distribution::{SourcePie, load_source_distribution};
use crate::lanes::time_trend::{TrendChart, load_time_trend, sample_trend};
use crate::lanes::word_cloud::{WordCloudView, load_word_cloud};
use crate::lanes::{NO_SELECTION, TermSelected};
use crate::models::{AnalysisSelection, HistoryId, SourceMode, TimeUnit};
use crate::outputs::{Panel, PanelView, Surface};
use crate::state::{Region, RegionState};
use chrono::Local;
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A lane load that no longer borrows the session that started it.
pub type LaneTask = LocalBoxFuture<'static, ()>;

/// Everything visible at one moment, as written by `save`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    pub captured_at: String,
    pub selection: AnalysisSelection,
    pub keyword: String,
    pub time_unit: TimeUnit,
    pub word_cloud: PanelView,
    pub hot_words: PanelView,
    pub time_trend: PanelView,
    pub source_distribution: PanelView,
}

fn idle<V>() -> RegionState<V> {
    RegionState::Empty(NO_SELECTION.to_string())
}

pub struct AnalysisSession<A: AnalysisApi> {
    api: Arc<A>,
    config: Arc<AnalysisConfig>,
    surface: Arc<dyn Surface>,
    selection: AnalysisSelection,
    keyword: String,
    time_unit: TimeUnit,
    source_mode: Option<SourceMode>,
    word_cloud: Arc<Region<WordCloudView>>,
    hot_words: Arc<Region<HotWordsView>>,
    time_trend: Arc<Region<TrendChart>>,
    source_distribution: Arc<Region<SourcePie>>,
}

impl<A: AnalysisApi + 'static> AnalysisSession<A> {
    /// A session with nothing selected; every region shows the selection prompt.
    pub fn new(api: A, config: AnalysisConfig, surface: Arc<dyn Surface>) -> Self {
        let sources = Region::new(Panel::SourceDistribution, surface.clone(), idle());
        Self {
            word_cloud: Arc::new(Region::new(Panel::WordCloud, surface.clone(), idle())),
            hot_words: Arc::new(Region::new(Panel::HotWords, surface.clone(), idle())),
            time_trend: Arc::new(Region::new(Panel::TimeTrend, surface.clone(), idle())),
            source_distribution: Arc::new(sources),
            keyword: config.default_keyword.clone(),
            time_unit: config.time_trend.default_time_unit,
            source_mode: config.word_cloud.source_mode,
            selection: AnalysisSelection::none(),
            api: Arc::new(api),
            config: Arc::new(config),
            surface,
        }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn selection(&self) -> AnalysisSelection {
        self.selection
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    pub fn source_mode(&self) -> Option<SourceMode> {
        self.source_mode
    }

    /// Start analyzing `history_id`: reset the keyword and load every lane.
    ///
    /// # Arguments
    ///
    /// * `history_id` - The crawl history to analyze
    ///
    /// # Returns
    ///
    /// The combined task of all four lanes.
    #[instrument(level = "info", skip(self))]
    pub fn begin_analysis(&mut self, history_id: HistoryId) -> LaneTask {
        self.selection = AnalysisSelection::new(history_id);
        self.keyword = self.config.default_keyword.clone();
        if self.config.time_trend.show_sample {
            self.time_trend.present(RegionState::Populated(sample_trend()));
        }
        info!(keyword = %self.keyword, time_unit = %self.time_unit, "Starting analysis");
        self.refresh()
    }

    /// Reload all four lanes for the current selection.
    ///
    /// The lanes run concurrently and finish in any order.
    pub fn refresh(&self) -> LaneTask {
        let lanes = (
            self.load_word_cloud(),
            self.load_hot_words(),
            self.load_time_trend(),
            self.load_source_distribution(),
        );
        let history_id = self.selection.history_id;
        async move {
            futures::join!(lanes.0, lanes.1, lanes.2, lanes.3);
            debug!(?history_id, "All lanes settled");
        }
        .boxed_local()
    }

    pub fn load_word_cloud(&self) -> LaneTask {
        let api = Arc::clone(&self.api);
        let config = Arc::clone(&self.config);
        let region = Arc::clone(&self.word_cloud);
        let selection = self.selection;
        let source_mode = self.source_mode;
        async move {
            let cloud = &config.word_cloud;
            load_word_cloud(&*api, &selection, source_mode, cloud, config.theme, &region).await;
        }
        .boxed_local()
    }

    pub fn load_hot_words(&self) -> LaneTask {
        let api = Arc::clone(&self.api);
        let config = Arc::clone(&self.config);
        let region = Arc::clone(&self.hot_words);
        let selection = self.selection;
        async move {
            let hot_words = &config.hot_words;
            load_hot_words(
                &*api,
                &selection,
                hot_words.limit,
                hot_words.variant,
                hot_words.cap(),
                &region,
            )
            .await;
        }
        .boxed_local()
    }

    pub fn load_time_trend(&self) -> LaneTask {
        let api = Arc::clone(&self.api);
        let region = Arc::clone(&self.time_trend);
        let selection = self.selection;
        let keyword = self.keyword.clone();
        let time_unit = self.time_unit;
        let watchdog = self.config.time_trend.watchdog();
        async move {
            load_time_trend(&*api, &selection, &keyword, time_unit, watchdog, &region).await;
        }
        .boxed_local()
    }

    pub fn load_source_distribution(&self) -> LaneTask {
        let api = Arc::clone(&self.api);
        let config = Arc::clone(&self.config);
        let region = Arc::clone(&self.source_distribution);
        let selection = self.selection;
        async move {
            let sources = &config.source_distribution;
            load_source_distribution(&*api, &selection, sources, &region).await;
        }
        .boxed_local()
    }

    /// Query the trend of a keyword typed by the user.
    pub fn search_trend(&mut self, keyword: &str) -> LaneTask {
        self.keyword = keyword.trim().to_string();
        self.load_time_trend()
    }

    /// Make the selected term the trend keyword and show its trend.
    ///
    /// The trend panel is revealed before the request goes out.
    #[instrument(level = "info", skip_all, fields(term = %event.term))]
    pub fn select_term(&mut self, event: TermSelected) -> LaneTask {
        self.keyword = event.term;
        self.surface.reveal(Panel::TimeTrend);
        self.load_time_trend()
    }

    /// Select the word cloud term `text`.
    ///
    /// # Returns
    ///
    /// The trend reload, or `None` if the term is not on screen.
    pub fn select_cloud_term(&mut self, text: &str) -> Option<LaneTask> {
        let event = self
            .word_cloud
            .snapshot()
            .populated()
            .and_then(|view| view.term(text).map(|t| t.select()))?;
        Some(self.select_term(event))
    }

    /// Select the hot words row ranked `rank`; `None` if there is no such row.
    pub fn select_hot_word(&mut self, rank: usize) -> Option<LaneTask> {
        let event = self
            .hot_words
            .snapshot()
            .populated()
            .and_then(|view| view.row(rank).map(|r| r.select()))?;
        Some(self.select_term(event))
    }

    /// Change the trend granularity; re-queries at once if a keyword is set.
    pub fn set_time_unit(&mut self, time_unit: TimeUnit) -> LaneTask {
        self.time_unit = time_unit;
        if self.keyword.trim().is_empty() {
            debug!(%time_unit, "No keyword set; time unit stored for the next query");
            return future::ready(()).boxed_local();
        }
        self.load_time_trend()
    }

    /// Change which text the word cloud is built from and reload it.
    pub fn set_source_mode(&mut self, source_mode: Option<SourceMode>) -> LaneTask {
        self.source_mode = source_mode;
        self.load_word_cloud()
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        AnalysisSnapshot {
            captured_at: Local::now().to_rfc3339(),
            selection: self.selection,
            keyword: self.keyword.clone(),
            time_unit: self.time_unit,
            word_cloud: self.word_cloud.snapshot().map(Into::into),
            hot_words: self.hot_words.snapshot().map(Into::into),
            time_trend: self.time_trend.snapshot().map(Into::into),
            source_distribution: self.source_distribution.snapshot().map(Into::into),
        }
    }
}
