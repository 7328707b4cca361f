//! Word cloud lane.
//!
//! Fetches up to `limit` weighted terms for the selected history and lays
//! them out as a tag cloud. Font size grows sub-linearly with weight so a
//! single dominant term does not crowd out the rest.

use crate::api::AnalysisApi;
use crate::config::{CloudColorScheme, Theme, WordCloudConfig};
use crate::lanes::{NO_SELECTION, TermSelected, failure_state};
use crate::models::{AnalysisSelection, SourceMode, WordCloudEntry, WordCloudRequest};
use crate::state::{Region, RegionState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{info, instrument};

pub const EMPTY_MESSAGE: &str = "insufficient data for word cloud";

/// A term placed in the cloud.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudTerm {
    pub text: String,
    pub weight: f64,
    pub font_size: f64,
    pub color: String,
}

impl CloudTerm {
    pub fn select(&self) -> TermSelected {
        TermSelected {
            term: self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordCloudView {
    pub theme: Theme,
    pub terms: Vec<CloudTerm>,
}

impl WordCloudView {
    pub fn term(&self, text: &str) -> Option<&CloudTerm> {
        self.terms.iter().find(|t| t.text == text)
    }
}

/// Weights below zero or not finite count as zero.
fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

fn lightness(theme: Theme) -> u32 {
    match theme {
        Theme::Light => 45,
        Theme::Dark => 65,
    }
}

fn term_color(text: &str, weight: f64, scheme: CloudColorScheme, theme: Theme) -> String {
    let hue = match scheme {
        CloudColorScheme::Weighted => 210 + (weight.min(100.0) / 100.0 * 90.0).floor() as u32,
        CloudColorScheme::Scattered => {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            StdRng::seed_from_u64(hasher.finish()).random_range(0..360)
        }
    };
    format!("hsl({hue}, 70%, {}%)", lightness(theme))
}

/// Lay out weighted terms; entries with blank text are skipped.
pub fn render_word_cloud(
    entries: &[WordCloudEntry],
    config: &WordCloudConfig,
    theme: Theme,
) -> WordCloudView {
    let max_weight = entries
        .iter()
        .map(|e| sanitize_weight(e.weight))
        .fold(0.0_f64, f64::max);
    let span = (config.max_font - config.min_font).max(0.0);

    let terms = entries
        .iter()
        .filter(|e| !e.text.trim().is_empty())
        .map(|e| {
            let weight = sanitize_weight(e.weight);
            let scale = if max_weight > 0.0 {
                (weight / max_weight).powf(config.exponent)
            } else {
                0.0
            };
            let font_size = ((config.min_font + span * scale) * 10.0).round() / 10.0;
            CloudTerm {
                text: e.text.clone(),
                weight,
                font_size,
                color: term_color(&e.text, weight, config.color_scheme, theme),
            }
        })
        .collect();

    WordCloudView { theme, terms }
}

/// Load and render the word cloud for `selection`.
///
/// # Arguments
///
/// * `api` - Backend to query
/// * `selection` - The selected crawl history; `None` shows the selection prompt
/// * `source_mode` - Which article text to build the cloud from; `None` leaves it to the backend
/// * `config` - Request limit, font range and color scheme
/// * `theme` - Decides the lightness of the term colors
/// * `region` - Receives `Loading` and then the outcome
#[instrument(
    level = "info",
    skip_all,
    fields(history_id = ?selection.history_id, limit = config.limit)
)]
pub async fn load_word_cloud<A: AnalysisApi>(
    api: &A,
    selection: &AnalysisSelection,
    source_mode: Option<SourceMode>,
    config: &WordCloudConfig,
    theme: Theme,
    region: &Region<WordCloudView>,
) {
    let Some(history_id) = selection.history_id else {
        region.present(RegionState::Empty(NO_SELECTION.to_string()));
        return;
    };

    let ticket = region.begin();
    let request = WordCloudRequest {
        history_id,
        limit: config.limit,
        source: source_mode,
    };

    let state = match api.word_cloud(&request).await {
        Ok(response) => {
            let entries = response.word_cloud.unwrap_or_default();
            let view = render_word_cloud(&entries, config, theme);
            info!(terms = view.terms.len(), total = ?response.total, "Word cloud loaded");
            if view.terms.is_empty() {
                RegionState::Empty(EMPTY_MESSAGE.to_string())
            } else {
                RegionState::Populated(view)
            }
        }
        Err(e) => failure_state("word cloud", &e),
    };
    region.settle(ticket, state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outputs::Panel;
    use crate::testing::{FakeApi, RecordingSurface, WORD_CLOUD};
    use serde_json::json;
    use std::sync::Arc;

    fn entry(text: &str, weight: f64) -> WordCloudEntry {
        WordCloudEntry {
            text: text.to_string(),
            weight,
        }
    }

    fn region() -> Region<WordCloudView> {
        let surface = Arc::new(RecordingSurface::default());
        Region::new(Panel::WordCloud, surface, RegionState::Empty(NO_SELECTION.into()))
    }

    #[test]
    fn test_font_size_is_sublinear() {
        let config = WordCloudConfig::default();
        let view = render_word_cloud(
            &[entry("big", 100.0), entry("quarter", 25.0), entry("zero", 0.0)],
            &config,
            Theme::Light,
        );
        assert_eq!(view.terms[0].font_size, 64.0);
        // sqrt(0.25) = 0.5 → halfway between 12 and 64
        assert_eq!(view.terms[1].font_size, 38.0);
        assert_eq!(view.terms[2].font_size, 12.0);
    }

    #[test]
    fn test_negative_and_nan_weights_clamp_to_zero() {
        let view = render_word_cloud(
            &[entry("a", -5.0), entry("b", f64::NAN), entry("  ", 9.0)],
            &WordCloudConfig::default(),
            Theme::Light,
        );
        assert_eq!(view.terms.len(), 2);
        assert!(view.terms.iter().all(|t| t.weight == 0.0 && t.font_size == 12.0));
    }

    #[test]
    fn test_weighted_color_depends_on_theme() {
        let config = WordCloudConfig::default();
        let light = render_word_cloud(&[entry("x", 50.0)], &config, Theme::Light);
        let dark = render_word_cloud(&[entry("x", 50.0)], &config, Theme::Dark);
        assert_eq!(light.terms[0].color, "hsl(255, 70%, 45%)");
        assert_eq!(dark.terms[0].color, "hsl(255, 70%, 65%)");
    }

    #[test]
    fn test_scattered_color_is_stable_per_term() {
        let config = WordCloudConfig {
            color_scheme: CloudColorScheme::Scattered,
            ..WordCloudConfig::default()
        };
        let first = render_word_cloud(&[entry("科技", 3.0)], &config, Theme::Dark);
        let second = render_word_cloud(&[entry("科技", 3.0)], &config, Theme::Dark);
        assert_eq!(first, second);
    }

    #[test]
    fn test_term_selection_event() {
        let config = WordCloudConfig::default();
        let view = render_word_cloud(&[entry("科技", 3.0)], &config, Theme::Light);
        let event = view.term("科技").unwrap().select();
        assert_eq!(event.term, "科技");
        assert!(view.term("体育").is_none());
    }

    #[tokio::test]
    async fn test_absent_selection_sends_nothing() {
        let api = FakeApi::new();
        let region = region();
        load_word_cloud(
            &api,
            &AnalysisSelection::none(),
            None,
            &WordCloudConfig::default(),
            Theme::Light,
            &region,
        )
        .await;
        assert_eq!(api.total_calls(), 0);
        assert_eq!(region.snapshot().message(), Some(NO_SELECTION));
    }

    #[tokio::test]
    async fn test_populated_cloud() {
        let api = FakeApi::new().reply(
            WORD_CLOUD,
            200,
            r#"{"wordCloud":[{"text":"科技","weight":80},{"text":"经济","weight":20}],"total":2}"#,
        );
        let region = region();
        load_word_cloud(
            &api,
            &AnalysisSelection::new(4),
            Some(SourceMode::Keywords),
            &WordCloudConfig::default(),
            Theme::Light,
            &region,
        )
        .await;

        assert_eq!(
            api.last_body(WORD_CLOUD),
            Some(json!({"historyId": 4, "limit": 100, "source": "keywords"}))
        );
        let state = region.snapshot();
        let view = state.populated().unwrap();
        assert_eq!(view.terms.len(), 2);
        assert_eq!(view.terms[0].text, "科技");
    }

    #[tokio::test]
    async fn test_empty_cloud_is_empty_state() {
        let api = FakeApi::new().reply(WORD_CLOUD, 200, r#"{"wordCloud":[],"total":0}"#);
        let region = region();
        load_word_cloud(
            &api,
            &AnalysisSelection::new(4),
            None,
            &WordCloudConfig::default(),
            Theme::Light,
            &region,
        )
        .await;
        assert_eq!(region.snapshot(), RegionState::Empty(EMPTY_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_error_status_is_error_state() {
        let api = FakeApi::new().reply(WORD_CLOUD, 500, r#"{"error":"boom"}"#);
        let region = region();
        load_word_cloud(
            &api,
            &AnalysisSelection::new(4),
            None,
            &WordCloudConfig::default(),
            Theme::Light,
            &region,
        )
        .await;
        let state = region.snapshot();
        assert!(matches!(state, RegionState::Error(_)));
        assert!(state.message().unwrap().contains("failed to load word cloud data"));
    }
}
