//! HTTP client for the agent backend

use std::time::Duration;

use futures::StreamExt;
use reqwest::Url;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    decoder::ByteStream,
    error::{Error, Result},
    types::{Ack, ChatRequest, HistoryEntry},
};

/// Where the backend listens when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Client for the agent backend's REST and streaming endpoints.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct AgentClient {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Option<Duration>,
}

impl AgentClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: parse_base_url(&base_url.into())?,
            request_timeout: None,
        })
    }

    /// Apply a timeout to plain request/response calls.
    ///
    /// The chat stream is exempt: a turn may legitimately run for minutes.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Resolve an endpoint path below the base URL, keeping any path prefix
    /// the base carries.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidConfig(format!("bad endpoint path '{}': {}", path, e)))
    }

    /// Start a chat turn and return the raw response body.
    ///
    /// Fails if the connection cannot be opened or the backend answers with a
    /// non-success status; read errors after that surface on the stream.
    pub async fn open_chat_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let url = self.url("/api/chat/stream")?;
        tracing::debug!("Opening chat stream at {}", url);

        let response = self
            .client
            .post(url)
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| Error::Stream(e.to_string()))),
        ))
    }

    /// Server-side conversation memory
    pub async fn chat_history(&self) -> Result<Vec<HistoryEntry>> {
        self.get_json("/api/chat/history").await
    }

    /// Wipe the server-side conversation memory
    pub async fn clear_chat_history(&self) -> Result<Ack> {
        self.delete_json("/api/chat/clear").await
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path)?);
        self.execute(request).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(self.url(path)?).json(body);
        self.execute(request).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.post(self.url(path)?);
        self.execute(request).await
    }

    pub(crate) async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.put(self.url(path)?).json(body);
        self.execute(request).await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.delete(self.url(path)?);
        self.execute(request).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let request = self.client.post(self.url(path)?).multipart(form);
        self.execute(request).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let request = match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };
        let response = check_status(request.send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Parse and check a backend address.
///
/// The result always ends in `/` so endpoint paths join below it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidConfig("base URL is empty".to_string()));
    }

    let mut url = Url::parse(raw)
        .map_err(|e| Error::InvalidConfig(format!("invalid base URL '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidConfig(format!(
            "base URL must use http or https, got '{}'",
            raw
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidConfig(format!("base URL '{}' has no host", raw)));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::InvalidConfig(format!(
            "base URL '{}' must not carry a query or fragment",
            raw
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Turn a non-success response into [`Error::Api`], keeping the body text.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        body
    };
    Err(Error::api(status.as_u16(), message))
}

/// Percent-encode a single path segment (collection names, rule ids, ...)
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
