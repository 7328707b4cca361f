//! HTTP access to the crawler backend's analysis endpoints.
//!
//! The lanes talk to the backend through the [`AnalysisApi`] trait so they can
//! be driven by the real [`HttpAnalysisApi`] or by an in-memory fake in tests.
//!
//! # Endpoints
//!
//! | Call | Method & Path |
//! |------|---------------|
//! | [`AnalysisApi::word_cloud`] | `POST /api/analysis/word-cloud` |
//! | [`AnalysisApi::hot_words`] | `POST /api/analysis/hot-words` |
//! | [`AnalysisApi::time_trend`] | `POST /api/analysis/time-trend` |
//! | [`AnalysisApi::source_distribution`] | `POST /api/analysis/source-distribution` |
//! | [`AnalysisApi::history_news`] | `GET /api/history/{historyId}/news` |
//!
//! Requests are sent once. There is no retry and no timeout: a failed call is
//! reported to the lane, which turns it into a visible error state.

use crate::models::{
    HistoryId, HotWordsRequest, HotWordsResponse, NewsRecord, SourceDistributionPayload,
    SourceDistributionRequest, TimeTrendRequest, TimeTrendResponse, WordCloudRequest,
    WordCloudResponse,
};
use crate::utils::truncate_for_log;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

/// Why a backend call did not produce a usable body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never got a response (connection refused, DNS, reset...).
    #[error("request failed: {0}")]
    Transport(String),
    /// The backend answered with a non-2xx status.
    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },
    /// The body was not the JSON we expected.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// The message the backend attached to a failed response, if any.
    ///
    /// The backend reports failures as `{"error": "..."}`; plain text bodies
    /// are passed through as-is.
    pub fn server_message(&self) -> Option<String> {
        match self {
            FetchError::Status { body, .. } => {
                let body = body.trim();
                if body.is_empty() {
                    return None;
                }
                let from_json = serde_json::from_str::<serde_json::Value>(body)
                    .ok()
                    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
                Some(from_json.unwrap_or_else(|| body.to_string()))
            }
            _ => None,
        }
    }
}

/// Async access to the analysis endpoints.
pub trait AnalysisApi {
    async fn word_cloud(&self, req: &WordCloudRequest) -> Result<WordCloudResponse, FetchError>;

    async fn hot_words(&self, req: &HotWordsRequest) -> Result<HotWordsResponse, FetchError>;

    async fn time_trend(&self, req: &TimeTrendRequest) -> Result<TimeTrendResponse, FetchError>;

    async fn source_distribution(
        &self,
        req: &SourceDistributionRequest,
    ) -> Result<SourceDistributionPayload, FetchError>;

    /// Raw articles of a crawl history, used to rebuild the source distribution.
    async fn history_news(&self, history_id: HistoryId) -> Result<Vec<NewsRecord>, FetchError>;
}

/// [`AnalysisApi`] backed by `reqwest`.
///
/// The optional session cookie is sent on every request so the backend's
/// login check passes.
#[derive(Debug, Clone)]
pub struct HttpAnalysisApi {
    client: Client,
    base_url: Url,
}

impl HttpAnalysisApi {
    /// Build a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Fails if the cookie is not a valid header value or the TLS backend
    /// cannot be initialized.
    pub fn new(
        base_url: Url,
        session_cookie: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie.filter(|c| !c.trim().is_empty()) {
            headers.insert(COOKIE, HeaderValue::from_str(cookie.trim())?);
        }
        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|e| FetchError::Transport(format!("invalid endpoint {path}: {e}")))
    }

    #[instrument(level = "debug", skip_all, fields(%method, %path))]
    async fn call<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, FetchError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let t0 = Instant::now();

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "request failed");
            FetchError::Transport(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let elapsed_ms = t0.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms,
                body = %truncate_for_log(&text, 200),
                "backend returned an error status"
            );
            return Err(status_error(status, text));
        }

        debug!(status = status.as_u16(), elapsed_ms, bytes = text.len(), "response received");
        Ok(serde_json::from_str(&text)?)
    }
}

fn status_error(status: StatusCode, body: String) -> FetchError {
    FetchError::Status {
        status: status.as_u16(),
        body,
    }
}

impl AnalysisApi for HttpAnalysisApi {
    async fn word_cloud(&self, req: &WordCloudRequest) -> Result<WordCloudResponse, FetchError> {
        self.call(Method::POST, "/api/analysis/word-cloud", Some(req)).await
    }

    async fn hot_words(&self, req: &HotWordsRequest) -> Result<HotWordsResponse, FetchError> {
        self.call(Method::POST, "/api/analysis/hot-words", Some(req)).await
    }

    async fn time_trend(&self, req: &TimeTrendRequest) -> Result<TimeTrendResponse, FetchError> {
        self.call(Method::POST, "/api/analysis/time-trend", Some(req)).await
    }

    async fn source_distribution(
        &self,
        req: &SourceDistributionRequest,
    ) -> Result<SourceDistributionPayload, FetchError> {
        self.call(Method::POST, "/api/analysis/source-distribution", Some(req))
            .await
    }

    async fn history_news(&self, history_id: HistoryId) -> Result<Vec<NewsRecord>, FetchError> {
        let path = format!("/api/history/{history_id}/news");
        self.call::<(), _>(Method::GET, &path, None).await
    }
}
