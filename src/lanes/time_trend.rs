//! Keyword time trend lane.
//!
//! Asks the backend how often a keyword appears per time bucket and turns the
//! answer into a line chart. The x axis keeps the order the backend sent;
//! buckets are never re-sorted here.
//!
//! The lane is triggered automatically when a history is opened (with the
//! default keyword), by the user typing a keyword, by changing the time unit,
//! and by selecting a term in the word cloud or hot words list.

use crate::api::AnalysisApi;
use crate::lanes::{NO_SELECTION, failure_state, with_watchdog};
use crate::models::{AnalysisSelection, TimeTrendRequest, TimeUnit, TrendPoint};
use crate::state::{Region, RegionState};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const MISSING_KEYWORD: &str = "please enter a keyword to query its trend";

/// Keyword of the sample series shown before real data arrives.
pub const SAMPLE_KEYWORD: &str = "经济";

const SAMPLE_SERIES: [(&str, u64); 7] = [
    ("2023-06-01", 5),
    ("2023-06-02", 8),
    ("2023-06-03", 12),
    ("2023-06-04", 6),
    ("2023-06-05", 15),
    ("2023-06-06", 9),
    ("2023-06-07", 11),
];

pub fn empty_message(keyword: &str) -> String {
    format!("no trend data found for keyword '{keyword}'")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendMark {
    pub category: String,
    pub value: u64,
}

/// A fully computed trend line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub title: String,
    /// Series name; the keyword the counts belong to.
    pub keyword: String,
    pub time_unit: TimeUnit,
    pub categories: Vec<String>,
    pub values: Vec<u64>,
    pub peak: Option<TrendMark>,
    pub trough: Option<TrendMark>,
    pub average: f64,
    /// `true` for the built-in sample series.
    pub sample: bool,
}

/// Build the chart for `points`, keeping their order.
///
/// # Arguments
///
/// * `points` - Buckets as the backend sent them
/// * `keyword` - Series name and part of the title
/// * `time_unit` - Bucket size shown in the title
pub fn render_trend(points: &[TrendPoint], keyword: &str, time_unit: TimeUnit) -> TrendChart {
    let categories: Vec<String> = points.iter().map(|p| p.time_point.clone()).collect();
    let values: Vec<u64> = points.iter().map(|p| p.count).collect();

    // first occurrence wins for both marks
    let mut peak: Option<&TrendPoint> = None;
    let mut trough: Option<&TrendPoint> = None;
    for point in points {
        if peak.is_none_or(|p| point.count > p.count) {
            peak = Some(point);
        }
        if trough.is_none_or(|t| point.count < t.count) {
            trough = Some(point);
        }
    }
    let mark = |p: &TrendPoint| TrendMark {
        category: p.time_point.clone(),
        value: p.count,
    };

    let average = if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<u64>() as f64 / values.len() as f64
    };

    TrendChart {
        title: format!("Time trend of keyword \"{keyword}\" (per {})", time_unit.label()),
        keyword: keyword.to_string(),
        time_unit,
        categories,
        values,
        peak: peak.map(mark),
        trough: trough.map(mark),
        average,
        sample: false,
    }
}

/// The fixed sample series shown while the first real request is pending.
pub fn sample_trend() -> TrendChart {
    let points: Vec<TrendPoint> = SAMPLE_SERIES
        .iter()
        .map(|(time_point, count)| TrendPoint {
            time_point: time_point.to_string(),
            count: *count,
        })
        .collect();
    TrendChart {
        sample: true,
        ..render_trend(&points, SAMPLE_KEYWORD, TimeUnit::Day)
    }
}

/// Load and render the trend of `keyword` bucketed by `time_unit`.
///
/// A blank keyword shows a prompt instead of sending a request. With a
/// `watchdog`, a load still pending after that delay shows the sample series
/// until the real answer lands.
#[instrument(
    level = "info",
    skip_all,
    fields(history_id = ?selection.history_id, %keyword, %time_unit)
)]
pub async fn load_time_trend<A: AnalysisApi>(
    api: &A,
    selection: &AnalysisSelection,
    keyword: &str,
    time_unit: TimeUnit,
    watchdog: Option<Duration>,
    region: &Region<TrendChart>,
) {
    let Some(history_id) = selection.history_id else {
        region.present(RegionState::Empty(NO_SELECTION.to_string()));
        return;
    };
    let keyword = keyword.trim();
    if keyword.is_empty() {
        region.present(RegionState::Empty(MISSING_KEYWORD.to_string()));
        return;
    }

    let ticket = region.begin();
    let request = TimeTrendRequest {
        history_id,
        keyword: keyword.to_string(),
        time_unit,
    };

    let result = with_watchdog(api.time_trend(&request), watchdog, region, ticket, || {
        RegionState::Populated(sample_trend())
    })
    .await;

    let state = match result {
        Ok(response) => {
            if let Some(echoed) = response.time_unit.as_deref() {
                if echoed != time_unit.as_str() {
                    debug!(requested = %time_unit, echoed, "Backend echoed a different time unit");
                }
            }
            debug!(echoed_keyword = ?response.keyword, "Trend response received");
            let points = response.trend_data.unwrap_or_default();
            info!(points = points.len(), "Time trend loaded");
            if points.is_empty() {
                RegionState::Empty(empty_message(keyword))
            } else {
                RegionState::Populated(render_trend(&points, keyword, time_unit))
            }
        }
        Err(e) => failure_state("trend", &e),
    };
    region.settle(ticket, state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::{Panel, PanelContent};
    use crate::testing::{FakeApi, RecordingSurface, TIME_TREND};
    use serde_json::json;
    use std::sync::Arc;

    fn point(time_point: &str, count: u64) -> TrendPoint {
        TrendPoint {
            time_point: time_point.to_string(),
            count,
        }
    }

    fn region_with(surface: &Arc<RecordingSurface>) -> Region<TrendChart> {
        Region::new(Panel::TimeTrend, surface.clone(), RegionState::Empty(NO_SELECTION.into()))
    }

    #[test]
    fn test_categories_and_values_keep_input_order() {
        let chart = render_trend(
            &[point("2023-06-01", 5), point("2023-06-02", 8)],
            "经济",
            TimeUnit::Day,
        );
        assert_eq!(chart.categories, vec!["2023-06-01", "2023-06-02"]);
        assert_eq!(chart.values, vec![5, 8]);
        assert_eq!(chart.keyword, "经济");
        assert!(chart.title.contains("经济"));
    }

    #[test]
    fn test_unordered_buckets_are_not_resorted() {
        let chart = render_trend(
            &[point("2023-06-03", 1), point("2023-06-01", 2)],
            "k",
            TimeUnit::Hour6,
        );
        assert_eq!(chart.categories, vec!["2023-06-03", "2023-06-01"]);
        assert!(chart.title.contains("6 hours"));
    }

    #[test]
    fn test_marks_and_average() {
        let chart = render_trend(
            &[point("a", 4), point("b", 9), point("c", 1), point("d", 9), point("e", 1)],
            "k",
            TimeUnit::Day,
        );
        assert_eq!(chart.peak.as_ref().unwrap().category, "b");
        assert_eq!(chart.trough.as_ref().unwrap().category, "c");
        assert_eq!(chart.average, 4.8);
    }

    #[test]
    fn test_sample_trend() {
        let chart = sample_trend();
        assert!(chart.sample);
        assert_eq!(chart.keyword, SAMPLE_KEYWORD);
        assert_eq!(chart.values, vec![5, 8, 12, 6, 15, 9, 11]);
    }

    #[tokio::test]
    async fn test_absent_selection_sends_nothing() {
        let api = FakeApi::new();
        let surface = Arc::new(RecordingSurface::default());
        let region = region_with(&surface);
        load_time_trend(&api, &AnalysisSelection::none(), "经济", TimeUnit::Day, None, &region).await;
        assert_eq!(api.total_calls(), 0);
        assert_eq!(region.snapshot().message(), Some(NO_SELECTION));
    }

    #[tokio::test]
    async fn test_blank_keyword_prompts_user() {
        let api = FakeApi::new();
        let surface = Arc::new(RecordingSurface::default());
        let region = region_with(&surface);
        let selection = AnalysisSelection::new(1);
        load_time_trend(&api, &selection, "   ", TimeUnit::Day, None, &region).await;
        assert_eq!(api.total_calls(), 0);
        assert_eq!(region.snapshot().message(), Some(MISSING_KEYWORD));
    }

    #[tokio::test]
    async fn test_populated_trend() {
        let api = FakeApi::new().reply(
            TIME_TREND,
            200,
            r#"{"keyword":"经济","timeUnit":"hour12","trendData":[{"timePoint":"2023-06-01","count":5},{"timePoint":"2023-06-02","count":8}]}"#,
        );
        let surface = Arc::new(RecordingSurface::default());
        let region = region_with(&surface);
        let selection = AnalysisSelection::new(2);
        load_time_trend(&api, &selection, " 经济 ", TimeUnit::Hour12, None, &region).await;

        assert_eq!(
            api.last_body(TIME_TREND),
            Some(json!({"historyId": 2, "keyword": "经济", "timeUnit": "hour12"}))
        );
        let state = region.snapshot();
        let chart = state.populated().unwrap();
        assert_eq!(chart.categories, vec!["2023-06-01", "2023-06-02"]);
        assert_eq!(chart.values, vec![5, 8]);
        assert_eq!(chart.time_unit, TimeUnit::Hour12);
    }

    #[tokio::test]
    async fn test_empty_trend_names_keyword() {
        let api = FakeApi::new().reply(TIME_TREND, 200, r#"{"keyword":"火星","trendData":[]}"#);
        let surface = Arc::new(RecordingSurface::default());
        let region = region_with(&surface);
        load_time_trend(&api, &AnalysisSelection::new(2), "火星", TimeUnit::Day, None, &region).await;
        assert_eq!(
            region.snapshot(),
            RegionState::Empty("no trend data found for keyword '火星'".to_string())
        );
    }

    #[tokio::test]
    async fn test_error_status_is_error_state() {
        let api = FakeApi::new().reply(TIME_TREND, 500, "");
        let surface = Arc::new(RecordingSurface::default());
        let region = region_with(&surface);
        load_time_trend(&api, &AnalysisSelection::new(2), "经济", TimeUnit::Day, None, &region).await;
        let state = region.snapshot();
        assert!(matches!(state, RegionState::Error(_)));
        assert!(state.message().unwrap().contains("failed to load trend data"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_shows_sample_then_real_result() {
        let api = FakeApi::new()
            .reply(
                TIME_TREND,
                200,
                r#"{"trendData":[{"timePoint":"2024-01-01","count":3}]}"#,
            )
            .delay(TIME_TREND, Duration::from_secs(30));
        let surface = Arc::new(RecordingSurface::default());
        let region = region_with(&surface);
        load_time_trend(
            &api,
            &AnalysisSelection::new(2),
            "科技",
            TimeUnit::Day,
            Some(Duration::from_secs(5)),
            &region,
        )
        .await;

        let commits = surface.commits_for(Panel::TimeTrend);
        assert_eq!(commits.len(), 3);
        assert!(commits[0].is_loading());
        match commits[1].populated() {
            Some(PanelContent::TimeTrend(chart)) => assert!(chart.sample),
            other => panic!("expected sample chart, got {other:?}"),
        }
        let state = region.snapshot();
        let chart = state.populated().unwrap();
        assert!(!chart.sample);
        assert_eq!(chart.keyword, "科技");
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_query_finishing_last_is_dropped() {
        let api = FakeApi::new()
            .reply(TIME_TREND, 200, r#"{"trendData":[{"timePoint":"2024-01-01","count":3}]}"#)
            .delay(TIME_TREND, Duration::from_secs(20))
            .delay(TIME_TREND, Duration::from_secs(1));
        let surface = Arc::new(RecordingSurface::default());
        let region = region_with(&surface);
        let selection = AnalysisSelection::new(2);

        tokio::join!(
            load_time_trend(&api, &selection, "旧词", TimeUnit::Day, None, &region),
            load_time_trend(&api, &selection, "新词", TimeUnit::Day, None, &region),
        );

        assert_eq!(api.call_count(TIME_TREND), 2);
        assert_eq!(region.snapshot().populated().unwrap().keyword, "新词");
        // loading twice, then only the newer chart
        let commits = surface.commits_for(Panel::TimeTrend);
        assert_eq!(commits.len(), 3);
        let newest = commits[2].populated();
        assert!(matches!(newest, Some(PanelContent::TimeTrend(c)) if c.keyword == "新词"));
    }
}
