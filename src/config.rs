//! Runtime configuration for the analysis view.
//!
//! Settings come from an optional YAML file; every field has a default so an
//! empty or partial file is valid. Command-line flags are applied on top by
//! `main`.
//!
//! ```yaml
//! base_url: http://localhost:8080
//! default_keyword: 经济
//! theme: dark
//! hot_words:
//!   variant: chart
//! source_distribution:
//!   variant: full
//!   placeholder_on_failure: false
//! ```

use crate::models::{SourceMode, TimeUnit};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Background the panels are drawn on; decides text and cloud lightness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// How word cloud terms are colored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudColorScheme {
    /// Hue follows the term weight (blue for light terms, purple for heavy ones).
    #[default]
    Weighted,
    /// Hue scattered per term, stable for a given text.
    Scattered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HotWordsVariant {
    /// Numbered ranking list.
    #[default]
    List,
    /// Horizontal bar chart with a color per bar.
    Chart,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceVariant {
    /// Only the largest few sources.
    #[default]
    Compact,
    /// Every source, with a scrolling legend.
    Full,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WordCloudConfig {
    pub limit: usize,
    pub source_mode: Option<SourceMode>,
    pub color_scheme: CloudColorScheme,
    pub min_font: f64,
    pub max_font: f64,
    /// Exponent of the weight → font size curve; below 1 keeps outliers in check.
    pub exponent: f64,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            source_mode: None,
            color_scheme: CloudColorScheme::Weighted,
            min_font: 12.0,
            max_font: 64.0,
            exponent: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HotWordsConfig {
    pub limit: usize,
    pub variant: HotWordsVariant,
    pub display_cap: Option<usize>,
}

impl Default for HotWordsConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            variant: HotWordsVariant::List,
            display_cap: None,
        }
    }
}

impl HotWordsConfig {
    /// Rows shown at most; the chart variant has room for more bars.
    pub fn cap(&self) -> usize {
        self.display_cap.unwrap_or(match self.variant {
            HotWordsVariant::List => 10,
            HotWordsVariant::Chart => 15,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeTrendConfig {
    pub default_time_unit: TimeUnit,
    /// Show the sample series when the analysis view opens.
    pub show_sample: bool,
    pub watchdog_secs: Option<u64>,
}

impl Default for TimeTrendConfig {
    fn default() -> Self {
        Self {
            default_time_unit: TimeUnit::Day,
            show_sample: true,
            watchdog_secs: Some(5),
        }
    }
}

impl TimeTrendConfig {
    pub fn watchdog(&self) -> Option<Duration> {
        self.watchdog_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceDistributionConfig {
    pub variant: SourceVariant,
    /// Slices kept by the compact variant.
    pub top_n: usize,
    pub legend_max_chars: usize,
    pub watchdog_secs: Option<u64>,
    /// Render the placeholder distribution when neither the endpoint nor the
    /// raw articles produce data.
    pub placeholder_on_failure: bool,
}

impl Default for SourceDistributionConfig {
    fn default() -> Self {
        Self {
            variant: SourceVariant::Compact,
            top_n: 3,
            legend_max_chars: 10,
            watchdog_secs: Some(10),
            placeholder_on_failure: true,
        }
    }
}

impl SourceDistributionConfig {
    /// Delay before a slow load shows the placeholder. Strict mode has no
    /// placeholder, so it never gets a watchdog.
    pub fn watchdog(&self) -> Option<Duration> {
        self.watchdog_secs
            .filter(|_| self.placeholder_on_failure)
            .map(Duration::from_secs)
    }
}

/// Everything the analysis session needs besides the selection itself.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub base_url: String,
    /// Keyword the time trend starts with when a history is opened.
    pub default_keyword: String,
    pub theme: Theme,
    pub word_cloud: WordCloudConfig,
    pub hot_words: HotWordsConfig,
    pub time_trend: TimeTrendConfig,
    pub source_distribution: SourceDistributionConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            default_keyword: "经济".to_string(),
            theme: Theme::Light,
            word_cloud: WordCloudConfig::default(),
            hot_words: HotWordsConfig::default(),
            time_trend: TimeTrendConfig::default(),
            source_distribution: SourceDistributionConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a YAML document; missing fields take their defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Load configuration from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&raw)?;
        info!(base_url = %config.base_url, "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = AnalysisConfig::from_yaml("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.word_cloud.limit, 100);
        assert_eq!(config.hot_words.cap(), 10);
        assert_eq!(config.default_keyword, "经济");
        assert!(config.source_distribution.placeholder_on_failure);
    }

    #[test]
    fn test_partial_yaml_overrides_only_given_fields() {
        let yaml = "theme: dark\nhot_words:\n  variant: chart\n\
                    source_distribution:\n  variant: full\n  watchdog_secs: null\n";
        let config = AnalysisConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.hot_words.variant, HotWordsVariant::Chart);
        assert_eq!(config.hot_words.cap(), 15);
        assert_eq!(config.hot_words.limit, 10);
        assert_eq!(config.source_distribution.variant, SourceVariant::Full);
        assert_eq!(config.source_distribution.watchdog(), None);
        assert_eq!(config.source_distribution.legend_max_chars, 10);
    }

    #[test]
    fn test_time_unit_and_source_mode_in_yaml() {
        let config = AnalysisConfig::from_yaml(
            "time_trend:\n  default_time_unit: hour6\nword_cloud:\n  source_mode: title\n",
        )
        .unwrap();
        assert_eq!(config.time_trend.default_time_unit, TimeUnit::Hour6);
        assert_eq!(config.word_cloud.source_mode, Some(SourceMode::Title));
        assert_eq!(config.time_trend.watchdog(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_strict_sources_have_no_watchdog() {
        let config = AnalysisConfig::from_yaml(
            "source_distribution:\n  placeholder_on_failure: false\n  watchdog_secs: 3\n",
        )
        .unwrap();
        assert_eq!(config.source_distribution.watchdog_secs, Some(3));
        assert_eq!(config.source_distribution.watchdog(), None);
        assert_eq!(
            SourceDistributionConfig::default().watchdog(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(AnalysisConfig::from_yaml("theme: [unclosed").is_err());
        assert!(AnalysisConfig::from_yaml("theme: sepia").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        tokio::fs::write(&path, "base_url: http://crawler.local:9000\n")
            .await
            .unwrap();
        let config = AnalysisConfig::load(&path).await.unwrap();
        assert_eq!(config.base_url, "http://crawler.local:9000");
    }
}
