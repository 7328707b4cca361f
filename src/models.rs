//! Data models for the analysis lanes and the backend's JSON shapes.
//!
//! This module defines the structures exchanged with the crawler backend:
//! - [`AnalysisSelection`]: The crawl history currently being analyzed
//! - Entry types: [`WordCloudEntry`], [`HotWordEntry`], [`TrendPoint`], [`SourceCount`]
//! - Request bodies for the four `/api/analysis/*` endpoints
//! - Response envelopes, including [`SourceDistributionPayload`] whose shape varies
//!
//! Field names follow the backend's camelCase JSON via `serde` renames.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier of a crawl history record on the backend.
pub type HistoryId = i64;

/// The crawl history the analysis view is scoped to.
///
/// An empty selection disables every lane: each one shows a prompt instead
/// of issuing a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSelection {
    pub history_id: Option<HistoryId>,
}

impl AnalysisSelection {
    pub fn new(history_id: HistoryId) -> Self {
        Self {
            history_id: Some(history_id),
        }
    }

    pub fn none() -> Self {
        Self { history_id: None }
    }
}

/// A weighted term for the word cloud.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WordCloudEntry {
    pub text: String,
    pub weight: f64,
}

/// A ranked keyword, pre-sorted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HotWordEntry {
    pub word: String,
    pub count: u64,
}

/// One bucket of a keyword time trend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub time_point: String,
    pub count: u64,
}

/// Number of crawled articles published by one source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

impl SourceCount {
    pub fn new(source: impl Into<String>, count: u64) -> Self {
        Self {
            source: source.into(),
            count,
        }
    }
}

/// Bucket granularity for the keyword time trend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Day,
    Hour6,
    Hour12,
}

impl TimeUnit {
    /// Wire value expected by `/api/analysis/time-trend`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Day => "day",
            TimeUnit::Hour6 => "hour6",
            TimeUnit::Hour12 => "hour12",
        }
    }

    /// Human readable label used in chart titles.
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Day => "day",
            TimeUnit::Hour6 => "6 hours",
            TimeUnit::Hour12 => "12 hours",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "d" => Ok(TimeUnit::Day),
            "hour6" | "6h" => Ok(TimeUnit::Hour6),
            "hour12" | "12h" => Ok(TimeUnit::Hour12),
            other => Err(format!("unknown time unit '{other}' (expected day, hour6 or hour12)")),
        }
    }
}

/// Which article text the word cloud is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Title,
    Content,
    Keywords,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(SourceMode::Title),
            "content" => Ok(SourceMode::Content),
            "keywords" => Ok(SourceMode::Keywords),
            other => Err(format!("unknown word cloud source '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCloudRequest {
    pub history_id: HistoryId,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotWordsRequest {
    pub history_id: HistoryId,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTrendRequest {
    pub history_id: HistoryId,
    pub keyword: String,
    pub time_unit: TimeUnit,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDistributionRequest {
    pub history_id: HistoryId,
}

/// Body of a successful `/api/analysis/word-cloud` call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCloudResponse {
    #[serde(default)]
    pub word_cloud: Option<Vec<WordCloudEntry>>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotWordsResponse {
    #[serde(default)]
    pub hot_words: Option<Vec<HotWordEntry>>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Body of a successful `/api/analysis/time-trend` call.
///
/// The backend echoes the keyword and time unit it bucketed by.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTrendResponse {
    #[serde(default)]
    pub trend_data: Option<Vec<TrendPoint>>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub time_unit: Option<String>,
}

/// The shapes `/api/analysis/source-distribution` has been observed to return.
///
/// Variants are tried in declaration order, which is also their precedence:
/// a `sourceDistribution` array wins over a `sources` array, which wins over a
/// bare array; any other object is read as a `source -> count` map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceDistributionPayload {
    Named {
        #[serde(rename = "sourceDistribution")]
        source_distribution: Vec<Value>,
    },
    Alternate {
        sources: Vec<Value>,
    },
    Bare(Vec<Value>),
    Keyed(Map<String, Value>),
}

impl SourceDistributionPayload {
    /// Short name of the wire shape, for logging.
    pub fn shape(&self) -> &'static str {
        match self {
            SourceDistributionPayload::Named { .. } => "sourceDistribution",
            SourceDistributionPayload::Alternate { .. } => "sources",
            SourceDistributionPayload::Bare(_) => "array",
            SourceDistributionPayload::Keyed(_) => "object",
        }
    }

    /// Normalize any accepted shape into the canonical sequence.
    pub fn into_canonical(self) -> Vec<SourceCount> {
        match self {
            SourceDistributionPayload::Named {
                source_distribution,
            } => normalize_entries(source_distribution),
            SourceDistributionPayload::Alternate { sources } => normalize_entries(sources),
            SourceDistributionPayload::Bare(entries) => normalize_entries(entries),
            SourceDistributionPayload::Keyed(map) => normalize_keyed(map),
        }
    }
}

/// `[{source, count}]` entries; anything without a string source and a
/// numeric count is dropped.
fn normalize_entries(entries: Vec<Value>) -> Vec<SourceCount> {
    entries
        .iter()
        .filter_map(|entry| {
            let source = entry.get("source")?.as_str()?;
            let count = count_of(entry.get("count")?)?;
            Some(SourceCount::new(source, count))
        })
        .collect()
}

/// `{source: count}` objects, in key enumeration order.
fn normalize_keyed(map: Map<String, Value>) -> Vec<SourceCount> {
    map.into_iter()
        .filter_map(|(source, count)| count_of(&count).map(|c| SourceCount::new(source, c)))
        .collect()
}

fn count_of(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

/// An article as returned by `/api/history/{id}/news`.
///
/// Only the fields the analysis view needs are kept.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}
