//! Test doubles shared by the lane and session tests.

use crate::api::{AnalysisApi, FetchError};
use crate::models::{
    HistoryId, HotWordsRequest, HotWordsResponse, NewsRecord, SourceDistributionPayload,
    SourceDistributionRequest, TimeTrendRequest, TimeTrendResponse, WordCloudRequest,
    WordCloudResponse,
};
use crate::outputs::{Panel, PanelView, Surface};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub const WORD_CLOUD: &str = "word-cloud";
pub const HOT_WORDS: &str = "hot-words";
pub const TIME_TREND: &str = "time-trend";
pub const SOURCES: &str = "source-distribution";
pub const NEWS: &str = "history-news";

#[derive(Debug, Clone)]
enum Reply {
    Http(u16, String),
    Unreachable,
}

/// Scripted [`AnalysisApi`]: one reply per endpoint, every call recorded.
///
/// Delays queue up per endpoint: each call takes the next one, and the last
/// one is reused once the queue is down to it.
#[derive(Debug, Default)]
pub struct FakeApi {
    replies: Mutex<HashMap<&'static str, Reply>>,
    delays: Mutex<HashMap<&'static str, VecDeque<Duration>>>,
    calls: Mutex<Vec<(&'static str, Value)>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, endpoint: &'static str, status: u16, body: &str) -> Self {
        self.set_reply(endpoint, status, body);
        self
    }

    pub fn unreachable(self, endpoint: &'static str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint, Reply::Unreachable);
        self
    }

    pub fn delay(self, endpoint: &'static str, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap()
            .entry(endpoint)
            .or_default()
            .push_back(delay);
        self
    }

    pub fn set_reply(&self, endpoint: &'static str, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint, Reply::Http(status, body.to_string()));
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .count()
    }

    pub fn last_body(&self, endpoint: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, body)| body.clone())
    }

    async fn respond<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: Value,
    ) -> Result<T, FetchError> {
        self.calls.lock().unwrap().push((endpoint, body));

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().copied()
                }
            });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or(Reply::Http(404, "no reply scripted".to_string()));

        match reply {
            Reply::Unreachable => Err(FetchError::Transport("connection refused".to_string())),
            Reply::Http(status, body) if (200..300).contains(&status) => {
                Ok(serde_json::from_str(&body)?)
            }
            Reply::Http(status, body) => Err(FetchError::Status { status, body }),
        }
    }
}

impl AnalysisApi for FakeApi {
    async fn word_cloud(&self, req: &WordCloudRequest) -> Result<WordCloudResponse, FetchError> {
        self.respond(WORD_CLOUD, serde_json::to_value(req)?).await
    }

    async fn hot_words(&self, req: &HotWordsRequest) -> Result<HotWordsResponse, FetchError> {
        self.respond(HOT_WORDS, serde_json::to_value(req)?).await
    }

    async fn time_trend(&self, req: &TimeTrendRequest) -> Result<TimeTrendResponse, FetchError> {
        self.respond(TIME_TREND, serde_json::to_value(req)?).await
    }

    async fn source_distribution(
        &self,
        req: &SourceDistributionRequest,
    ) -> Result<SourceDistributionPayload, FetchError> {
        self.respond(SOURCES, serde_json::to_value(req)?).await
    }

    async fn history_news(&self, history_id: HistoryId) -> Result<Vec<NewsRecord>, FetchError> {
        self.respond(NEWS, serde_json::json!({ "historyId": history_id }))
            .await
    }
}

/// [`Surface`] that remembers every commit and reveal.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commits: Mutex<Vec<(Panel, PanelView)>>,
    reveals: Mutex<Vec<Panel>>,
}

impl RecordingSurface {
    pub fn commits_for(&self, panel: Panel) -> Vec<PanelView> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| *p == panel)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn reveals(&self) -> Vec<Panel> {
        self.reveals.lock().unwrap().clone()
    }
}

impl Surface for RecordingSurface {
    fn commit(&self, panel: Panel, view: &PanelView) {
        self.commits.lock().unwrap().push((panel, view.clone()));
    }

    fn reveal(&self, panel: Panel) {
        self.reveals.lock().unwrap().push(panel);
    }
}
