//! Plain-text rendering of the panels.
//!
//! [`render_panel`] turns one panel's state into text for a given terminal
//! width. [`TerminalSurface`] prints every commit and keeps the last view of
//! each panel so a width change can redraw everything.

use crate::config::HotWordsVariant;
use crate::lanes::hot_words::{HotWordsView, Medal};
use crate::lanes::source_distribution::{DistributionOrigin, SourcePie};
use crate::lanes::time_trend::TrendChart;
use crate::lanes::word_cloud::WordCloudView;
use crate::outputs::{Panel, PanelContent, PanelView, Surface};
use crate::state::RegionState;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

pub const DEFAULT_WIDTH: usize = 80;
const MIN_WIDTH: usize = 40;
const BAR: char = '█';

fn header(title: &str, width: usize) -> String {
    let head = format!("== {title} ");
    let fill = width.saturating_sub(head.chars().count());
    format!("{head}{}", "=".repeat(fill))
}

fn bar(value: u64, max: u64, room: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let len = ((value as f64 / max as f64) * room as f64).round() as usize;
    BAR.to_string().repeat(len.max(usize::from(value > 0)))
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{s}{}", " ".repeat(width.saturating_sub(len)))
}

fn word_cloud_lines(view: &WordCloudView, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::from(" ");
    for term in &view.terms {
        let cell = format!(" {}({:.0})", term.text, term.font_size);
        if line.chars().count() + cell.chars().count() > width && !line.trim().is_empty() {
            lines.push(std::mem::replace(&mut line, String::from(" ")));
        }
        line.push_str(&cell);
    }
    if !line.trim().is_empty() {
        lines.push(line);
    }
    lines
}

fn hot_words_lines(view: &HotWordsView, width: usize) -> Vec<String> {
    let word_w = view.rows.iter().map(|r| r.word.chars().count()).max().unwrap_or(0);
    let max = view.rows.iter().map(|r| r.count).max().unwrap_or(0);
    view.rows
        .iter()
        .map(|row| {
            let marker = match row.medal {
                Some(Medal::Gold) => '*',
                Some(Medal::Silver) => '+',
                Some(Medal::Bronze) => '-',
                None => ' ',
            };
            let lead = format!("  {marker}{:>2}. {}", row.rank, pad(&row.word, word_w));
            match view.variant {
                HotWordsVariant::List => format!("{lead}  {}", row.count),
                HotWordsVariant::Chart => {
                    let room = width.saturating_sub(lead.chars().count() + 10).max(1);
                    format!("{lead} {} {}", bar(row.count, max, room), row.count)
                }
            }
        })
        .collect()
}

fn trend_lines(chart: &TrendChart, width: usize) -> Vec<String> {
    let mut lines = vec![if chart.sample {
        format!("  {} (sample)", chart.title)
    } else {
        format!("  {}", chart.title)
    }];
    let label_w = chart.categories.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    let max = chart.values.iter().copied().max().unwrap_or(0);
    let room = width.saturating_sub(label_w + 12).max(1);
    for (category, value) in chart.categories.iter().zip(&chart.values) {
        lines.push(format!("  {} │{} {value}", pad(category, label_w), bar(*value, max, room)));
    }
    if let (Some(peak), Some(trough)) = (&chart.peak, &chart.trough) {
        lines.push(format!(
            "  peak {} ({})  trough {} ({})  average {:.1}",
            peak.category, peak.value, trough.category, trough.value, chart.average
        ));
    }
    lines
}

fn source_lines(pie: &SourcePie, width: usize) -> Vec<String> {
    let mut title = format!("  {}", pie.title);
    match pie.origin {
        DistributionOrigin::Endpoint => {}
        DistributionOrigin::Articles => title.push_str(" (tallied from articles)"),
        DistributionOrigin::Placeholder => title.push_str(" (placeholder)"),
    }
    let mut lines = vec![title];
    let label_w = pie.slices.iter().map(|s| s.label.chars().count()).max().unwrap_or(0);
    let room = width.saturating_sub(label_w + 20).max(1);
    for slice in &pie.slices {
        let len = (slice.percent / 100.0 * room as f64).round() as usize;
        let bar = BAR.to_string().repeat(len);
        // the tooltip carries the full name when the legend label is cut
        lines.push(format!("  {} {bar} {}", pad(&slice.label, label_w), slice.tooltip()));
    }
    lines
}

/// Render one panel as text lines no wider than `width` where possible.
pub fn render_panel(panel: Panel, view: &PanelView, width: usize) -> String {
    let width = width.max(MIN_WIDTH);
    let mut lines = vec![header(panel.title(), width)];
    match view {
        RegionState::Loading => lines.push("  loading...".to_string()),
        RegionState::Empty(message) => lines.push(format!("  {message}")),
        RegionState::Error(message) => lines.push(format!("  error: {message}")),
        RegionState::Populated(content) => lines.extend(match content {
            PanelContent::WordCloud(view) => word_cloud_lines(view, width),
            PanelContent::HotWords(view) => hot_words_lines(view, width),
            PanelContent::TimeTrend(chart) => trend_lines(chart, width),
            PanelContent::SourceDistribution(pie) => source_lines(pie, width),
        }),
    }
    lines.join("\n")
}

/// A [`Surface`] that prints to a writer, stdout by default.
pub struct TerminalSurface {
    out: Mutex<Box<dyn Write + Send>>,
    width: AtomicUsize,
    last: Mutex<BTreeMap<Panel, PanelView>>,
}

impl TerminalSurface {
    pub fn stdout(width: usize) -> Self {
        Self::with_writer(Box::new(io::stdout()), width)
    }

    pub fn with_writer(out: Box<dyn Write + Send>, width: usize) -> Self {
        Self {
            out: Mutex::new(out),
            width: AtomicUsize::new(width),
            last: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn width(&self) -> usize {
        self.width.load(Ordering::Relaxed)
    }

    /// Change the width and redraw every panel shown so far.
    pub fn set_width(&self, width: usize) {
        self.width.store(width, Ordering::Relaxed);
        let last = self.last.lock().unwrap_or_else(PoisonError::into_inner).clone();
        for (panel, view) in &last {
            self.print(*panel, view);
        }
    }

    fn print(&self, panel: Panel, view: &PanelView) {
        let text = render_panel(panel, view, self.width());
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{text}\n").and_then(|_| out.flush()) {
            warn!(%panel, error = %e, "Failed to write panel");
        }
    }
}

impl Surface for TerminalSurface {
    fn commit(&self, panel: Panel, view: &PanelView) {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(panel, view.clone());
        self.print(panel, view);
    }

    fn reveal(&self, panel: Panel) {
        let view = self
            .last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&panel)
            .cloned();
        if let Some(view) = view {
            self.print(panel, &view);
        }
    }
}
