//! Command-line interface and interactive commands.
//!
//! Start-up options are parsed with `clap`; the backend URL, session cookie
//! and config path can also come from environment variables. After the first
//! load the binary reads one [`Command`] per stdin line.

use crate::config::Theme;
use crate::models::{HistoryId, SourceMode, TimeUnit};
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Command-line arguments for the crawl analysis viewer.
///
/// # Examples
///
/// ```sh
/// # Analyze history 42 against a local backend
/// crawl-analysis --history-id 42
///
/// # Take the history from the page URL, print once and save a snapshot
/// crawl-analysis --page-url 'http://localhost:8080/analysis.html?historyId=42' \
///     --once -j ./snapshots
/// ```
#[derive(Parser, Debug)]
#[command(name = "crawl-analysis", author, version, about)]
pub struct Cli {
    /// Base URL of the crawler backend (overrides the config file)
    #[arg(short, long, env = "ANALYSIS_BASE_URL")]
    pub base_url: Option<String>,

    /// Crawl history to analyze
    #[arg(long, conflicts_with = "page_url")]
    pub history_id: Option<HistoryId>,

    /// Page URL carrying a `historyId` query parameter
    #[arg(long)]
    pub page_url: Option<String>,

    /// Session cookie sent with every request, e.g. `JSESSIONID=...`
    #[arg(long, env = "ANALYSIS_SESSION_COOKIE", hide_env_values = true)]
    pub session_cookie: Option<String>,

    /// Optional path to a config.yaml file
    #[arg(short, long, env = "ANALYSIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for JSON snapshots written by `save` and `--once`
    #[arg(short, long)]
    pub json_output_dir: Option<PathBuf>,

    /// Color theme (overrides the config file)
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Terminal width used to lay out panels
    #[arg(short, long, default_value_t = crate::outputs::terminal::DEFAULT_WIDTH)]
    pub width: usize,

    /// Load once, print, save (if `-j` is set) and exit
    #[arg(long)]
    pub once: bool,
}

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Select a word cloud term.
    Cloud(String),
    /// Select a hot words row by rank.
    Rank(usize),
    /// Query the trend of a keyword.
    Trend(String),
    Unit(TimeUnit),
    /// Change the word cloud text source; `None` lets the backend decide.
    Source(Option<SourceMode>),
    /// Analyze another history.
    History(HistoryId),
    Refresh,
    Width(usize),
    Save,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  cloud <term>                   select a word cloud term
  rank <n>                       select the n-th hot word
  trend <keyword>                query the trend of a keyword
  unit <day|hour6|hour12>        change the trend time unit
  source <title|content|keywords|default>
                                 change the word cloud text source
  history <id>                   analyze another crawl history
  refresh                        reload every panel
  width <cols>                   redraw panels for a new width
  save                           write a JSON snapshot
  quit                           exit";

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let need = |what: &str| {
            if rest.is_empty() {
                Err(format!("`{verb}` needs {what}"))
            } else {
                Ok(rest)
            }
        };

        match verb.to_lowercase().as_str() {
            "cloud" => Ok(Command::Cloud(need("a term")?.to_string())),
            "rank" => need("a rank")?
                .parse()
                .map(Command::Rank)
                .map_err(|_| format!("invalid rank '{rest}'")),
            // an empty keyword is passed on so the trend panel can prompt for one
            "trend" => Ok(Command::Trend(rest.to_string())),
            "unit" => need("a time unit")?.parse().map(Command::Unit),
            "source" => match need("a source")? {
                "default" | "none" => Ok(Command::Source(None)),
                other => other.parse().map(|mode| Command::Source(Some(mode))),
            },
            "history" => need("a history id")?
                .parse()
                .map(Command::History)
                .map_err(|_| format!("invalid history id '{rest}'")),
            "refresh" => Ok(Command::Refresh),
            "width" => need("a column count")?
                .parse()
                .map(Command::Width)
                .map_err(|_| format!("invalid width '{rest}'")),
            "save" => Ok(Command::Save),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => Err("empty command".to_string()),
            other => Err(format!("unknown command '{other}' (try `help`)")),
        }
    }
}
