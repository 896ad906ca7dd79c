use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{ApiError, ApiResult};
use super::model::{
    CreatedMemo, EmptyBody, JobProgress, MemoDraft, MemoId, MemoRecord, MemoUpdate,
    SearchRequest, SearchResult, StatusResponse,
};
use super::service::{IndexingJobService, MemoStore, SearchService};
use crate::config::Config;
use crate::search::SearchMode;

/// Paths relative to the API root.
mod paths {
    pub const MEMO: &str = "memo";
    pub const CATEGORIES: &str = "categories";
    pub const TAGS: &str = "tags";
    pub const INCREMENTAL_VECTORIZE: &str = "admin/incremental-vectorize";
    pub const PROGRESS: &str = "admin/progress";
    pub const REBUILD: &str = "admin/rebuild";
}

/// A request target: a fixed path plus an optional memo id as the last segment.
#[derive(Debug, Clone, Copy)]
struct Endpoint<'a> {
    path: &'static str,
    id: Option<&'a MemoId>,
}

impl<'a> Endpoint<'a> {
    fn memo(id: &'a MemoId) -> Self {
        Self {
            path: paths::MEMO,
            id: Some(id),
        }
    }
}

impl From<&'static str> for Endpoint<'_> {
    fn from(path: &'static str) -> Self {
        Self { path, id: None }
    }
}

impl std::fmt::Display for Endpoint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}/{}", self.path, id),
            None => f.write_str(self.path),
        }
    }
}

#[derive(Clone)]
/// reqwest implementation of the three backend services.
pub struct HttpBackend {
    http: HttpClient,
    api_root: String,
    root: Url,
}

impl HttpBackend {
    /// Creates a backend for `config.api_root()` with the configured request timeout.
    pub fn new(config: &Config) -> ApiResult<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild {
                message: e.to_string(),
            })?;
        Self::with_client(http, &config.api_root())
    }

    /// Creates a backend from an existing client and an API root such as
    /// `http://localhost:8000/api`.
    pub fn with_client(http: HttpClient, api_root: &str) -> ApiResult<Self> {
        let root = api_root.trim().trim_end_matches('/');
        let invalid = |message: String| ApiError::InvalidBaseUrl {
            url: root.to_string(),
            message,
        };
        let parsed = Url::parse(root).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_string()));
        }

        Ok(Self {
            http,
            api_root: root.to_string(),
            root: parsed,
        })
    }

    /// Returns the API root requests are resolved against.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Resolves `endpoint` against the API root. The memo id is percent-encoded as a
    /// single path segment.
    fn url(&self, endpoint: Endpoint<'_>) -> Url {
        let mut url = self.root.clone();
        // The root was checked to be a base URL in with_client().
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(endpoint.path.split('/'));
            if let Some(id) = endpoint.id {
                segments.push(id.as_str());
            }
        }
        url
    }

    async fn get_json<'a, T: DeserializeOwned>(
        &self,
        endpoint: impl Into<Endpoint<'a>>,
    ) -> ApiResult<T> {
        let endpoint = endpoint.into();
        let text = self
            .send("GET", endpoint, self.http.get(self.url(endpoint)))
            .await?;
        decode(endpoint, &text)
    }

    async fn post_json<'a, B, T>(&self, endpoint: impl Into<Endpoint<'a>>, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let endpoint = endpoint.into();
        let builder = self.http.post(self.url(endpoint)).json(body);
        let text = self.send("POST", endpoint, builder).await?;
        decode(endpoint, &text)
    }

    async fn post_for_status<'a, B>(
        &self,
        endpoint: impl Into<Endpoint<'a>>,
        body: &B,
    ) -> ApiResult<StatusResponse>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = endpoint.into();
        let builder = self.http.post(self.url(endpoint)).json(body);
        let text = self.send("POST", endpoint, builder).await?;
        if text.trim().is_empty() {
            return Ok(StatusResponse::default());
        }
        decode(endpoint, &text)
    }

    /// Sends the request and returns the body text of a 2xx response.
    async fn send(
        &self,
        method: &'static str,
        endpoint: Endpoint<'_>,
        builder: RequestBuilder,
    ) -> ApiResult<String> {
        debug!(method, %endpoint, "API request");

        let resp = builder.send().await.map_err(|e| ApiError::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(text) if !text.trim().is_empty() => text,
                _ => status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            };
            warn!(method, %endpoint, status = status.as_u16(), "API error response");
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await.map_err(|e| ApiError::Network {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        debug!(
            method,
            %endpoint,
            status = status.as_u16(),
            bytes = text.len(),
            "API response"
        );
        Ok(text)
    }
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("api_root", &self.api_root)
            .finish()
    }
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint<'_>, text: &str) -> ApiResult<T> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl SearchService for HttpBackend {
    async fn search(&self, mode: SearchMode, query: &str) -> ApiResult<Vec<SearchResult>> {
        self.post_json(mode.endpoint(), &SearchRequest { query })
            .await
    }
}

#[async_trait]
impl MemoStore for HttpBackend {
    async fn create_memo(&self, draft: &MemoDraft) -> ApiResult<CreatedMemo> {
        self.post_json(paths::MEMO, draft).await
    }

    async fn get_memo(&self, id: &MemoId) -> ApiResult<MemoRecord> {
        self.get_json(Endpoint::memo(id)).await
    }

    async fn update_memo(&self, id: &MemoId, update: &MemoUpdate) -> ApiResult<MemoRecord> {
        self.post_json(Endpoint::memo(id), update).await
    }

    async fn delete_memo(&self, id: &MemoId) -> ApiResult<StatusResponse> {
        self.post_for_status(Endpoint::memo(id), &EmptyBody {}).await
    }

    async fn list_categories(&self) -> ApiResult<Vec<String>> {
        self.get_json(paths::CATEGORIES).await
    }

    async fn list_tags(&self) -> ApiResult<Vec<String>> {
        self.get_json(paths::TAGS).await
    }
}

#[async_trait]
impl IndexingJobService for HttpBackend {
    async fn start_incremental(&self) -> ApiResult<StatusResponse> {
        self.post_for_status(paths::INCREMENTAL_VECTORIZE, &EmptyBody {})
            .await
    }

    async fn progress(&self) -> ApiResult<JobProgress> {
        self.get_json(paths::PROGRESS).await
    }

    async fn rebuild(&self) -> ApiResult<StatusResponse> {
        self.post_for_status(paths::REBUILD, &EmptyBody {}).await
    }
}
