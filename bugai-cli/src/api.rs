//! HTTP client for the BugAI server API.

use crate::CliResult;
use bugai_core::{AnalysisRequest, AnalysisResult, HistoryEntry};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default BugAI server URL.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Response payload for clearing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearSummary {
    /// Number of removed entries.
    pub deleted_count: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Non-success answer from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Server-provided detail, or the raw body when none was given.
    pub detail: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server returned {}: {}", self.status, self.detail)
    }
}

impl std::error::Error for ApiError {}

/// Normalize a server base URL, rejecting anything that is not http(s).
pub fn normalize_server_url(raw: &str) -> CliResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err("server URL must not be empty".into());
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(format!("server URL must start with http:// or https://: {trimmed}").into());
    }
    Ok(trimmed.to_string())
}

/// Reqwest-backed BugAI API client.
pub struct ApiClient {
    client: Client,
    server_url: String,
}

impl ApiClient {
    /// Build a client for `server_url`.
    pub fn new(server_url: &str) -> CliResult<Self> {
        let client = Client::builder().user_agent("bugai-cli").build()?;
        Ok(Self {
            client,
            server_url: normalize_server_url(server_url)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }

    /// Submit code for analysis.
    pub async fn analyze(&self, request: &AnalysisRequest) -> CliResult<AnalysisResult> {
        let response = self
            .client
            .post(self.url("/api/analyze"))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    /// Fetch the most recent history entries.
    pub async fn history(&self) -> CliResult<Vec<HistoryEntry>> {
        let response = self.client.get(self.url("/api/history")).send().await?;
        read_json(response).await
    }

    /// Delete all history entries.
    pub async fn clear_history(&self) -> CliResult<ClearSummary> {
        let response = self.client.delete(self.url("/api/history")).send().await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> CliResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let body = response.text().await?;
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|error| error.detail)
        .unwrap_or(body);
    Err(ApiError {
        status: status.as_u16(),
        detail,
    }
    .into())
}
