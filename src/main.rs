//! # Crawl Analysis
//!
//! A terminal viewer for the text analytics of a news crawl. Given a crawl
//! history id, it asks the crawler backend for four analyses and draws each
//! one as a panel:
//!
//! - **Word cloud**: weighted terms, sized by weight
//! - **Hot words**: the backend's keyword ranking
//! - **Keyword time trend**: counts of one keyword per day, 6 or 12 hours
//! - **Source distribution**: which news sources the articles came from
//!
//! ## Usage
//!
//! ```sh
//! crawl-analysis --history-id 42
//! crawl-analysis --page-url 'http://localhost:8080/analysis.html?historyId=42' \
//!     --once -j ./snapshots
//! ```
//!
//! ## Architecture
//!
//! 1. **Selection**: the history id comes from `--history-id` or the page URL
//! 2. **Lanes**: the four analyses load concurrently, each into its own region
//! 3. **Surface**: every region change is drawn by the terminal surface
//! 4. **Commands**: stdin commands re-query the trend, switch histories or save
//!    a JSON snapshot. They are read while lanes are still loading

use clap::Parser;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod api;
mod cli;
mod config;
mod lanes;
mod models;
mod outputs;
mod session;
mod state;
#[cfg(test)]
mod testing;
mod utils;

use api::{AnalysisApi, HttpAnalysisApi};
use cli::{Cli, Command, HELP};
use config::AnalysisConfig;
use outputs::json;
use outputs::terminal::TerminalSurface;
use session::{AnalysisSession, LaneTask};
use utils::{ensure_writable_dir, history_id_from_url};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr, so panels on stdout stay readable) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("crawl_analysis starting up");

    let args = Cli::parse();
    debug!(?args.history_id, ?args.page_url, ?args.config, "Parsed CLI arguments");

    // --- Config: file first, flags on top ---
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path).await?,
        None => AnalysisConfig::default(),
    };
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(theme) = args.theme {
        config.theme = theme;
    }

    // --- Selection ---
    let history_id = args.history_id.or_else(|| {
        let page_url = args.page_url.as_deref()?;
        let id = history_id_from_url(page_url);
        if id.is_none() {
            warn!(page_url, "Page URL has no usable historyId; nothing selected");
        }
        id
    });

    // Early check: snapshot dir must be writable before anything is loaded
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let api = HttpAnalysisApi::new(Url::parse(&config.base_url)?, args.session_cookie.as_deref())?;
    info!(base_url = %api.base_url(), history_id = ?history_id, "Backend client ready");

    let terminal = Arc::new(TerminalSurface::stdout(args.width));
    let mut session = AnalysisSession::new(api, config, terminal.clone());

    let first = match history_id {
        Some(id) => session.begin_analysis(id),
        None => session.refresh(),
    };

    if args.once {
        first.await;
        if let Some(dir) = &args.json_output_dir {
            save(&session, dir).await;
        }
        return Ok(());
    }

    // Lane loads run next to the prompt; a slow lane never blocks a command
    let mut in_flight: FuturesUnordered<LaneTask> = FuturesUnordered::new();
    in_flight.push(first);

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            Some(()) = in_flight.next(), if !in_flight.is_empty() => {
                debug!(in_flight = in_flight.len(), "Lane task finished");
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                warn!(input = %line.trim(), "{e}");
                continue;
            }
        };
        debug!(?command, "Command received");

        match command {
            Command::Cloud(term) => match session.select_cloud_term(&term) {
                Some(task) => in_flight.push(task),
                None => warn!(%term, "Term is not in the word cloud"),
            },
            Command::Rank(rank) => match session.select_hot_word(rank) {
                Some(task) => in_flight.push(task),
                None => warn!(rank, "No hot word with that rank"),
            },
            Command::Trend(keyword) => in_flight.push(session.search_trend(&keyword)),
            Command::Unit(unit) => {
                in_flight.push(session.set_time_unit(unit));
                info!(
                    keyword = session.keyword(),
                    time_unit = %session.time_unit(),
                    "Time unit changed"
                );
            }
            Command::Source(mode) => {
                in_flight.push(session.set_source_mode(mode));
                info!(source = ?session.source_mode(), "Word cloud source changed");
            }
            Command::History(id) => in_flight.push(session.begin_analysis(id)),
            Command::Refresh => in_flight.push(session.refresh()),
            Command::Width(width) => terminal.set_width(width),
            Command::Save => match &args.json_output_dir {
                Some(dir) => save(&session, dir).await,
                None => warn!("No --json-output-dir given; nothing saved"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }

    if !in_flight.is_empty() {
        debug!(in_flight = in_flight.len(), "Dropping unfinished lane loads");
    }
    info!(history_id = ?session.selection().history_id, "crawl_analysis finished");
    Ok(())
}

/// Write a snapshot; a failed write is logged and the session goes on.
async fn save<A: AnalysisApi + 'static>(session: &AnalysisSession<A>, dir: &Path) {
    match json::write_snapshot(&session.snapshot(), dir).await {
        Ok(path) => info!(path = %path.display(), "Snapshot saved"),
        Err(e) => error!(error = %e, "Failed to write snapshot"),
    }
}
