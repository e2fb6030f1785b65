use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::models::candidate::{Candidate, PassEvent};
use crate::models::filter::FilterBatch;
use crate::models::job::SearchJob;

/// Operations the dashboard needs from the remote research API.
#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync {
    /// Create a search job and return its id.
    async fn create_job(&self, query: &str) -> Result<String, ApiError>;

    async fn list_jobs(&self) -> Result<Vec<SearchJob>, ApiError>;

    /// Candidates surfaced so far. `ApiError::NotFound` when the job is gone.
    async fn job_candidates(&self, job_id: &str) -> Result<Vec<Candidate>, ApiError>;

    async fn pause_job(&self, job_id: &str) -> Result<(), ApiError>;

    async fn resume_job(&self, job_id: &str) -> Result<(), ApiError>;

    async fn delete_job(&self, job_id: &str) -> Result<(), ApiError>;

    /// Number of candidates of `job_id` the memory filter will look at.
    async fn filter_count(&self, job_id: &str) -> Result<u64, ApiError>;

    /// Process the next memory filter batch for `job_id`.
    async fn filter_batch(&self, job_id: &str) -> Result<FilterBatch, ApiError>;

    async fn suggestions(&self, job_id: &str) -> Result<Vec<String>, ApiError>;

    async fn track_pass(&self, event: &PassEvent) -> Result<(), ApiError>;
}

/// Every API response carries `success` and, on soft failure, `error`.
#[derive(Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct CreatedBody {
    #[serde(default)]
    job_id: Option<String>,
}

#[derive(Deserialize)]
struct JobsBody {
    #[serde(default)]
    jobs: Vec<SearchJob>,
}

#[derive(Deserialize)]
struct CandidatesBody {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct CountBody {
    #[serde(default)]
    total: u64,
}

#[derive(Deserialize)]
struct SuggestionsBody {
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Deserialize)]
struct Empty {}

/// reqwest-backed client for the research API.
pub struct HttpRemoteApi {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpRemoteApi {
    /// `timeout` of `None` keeps the transport default.
    pub fn new(
        base_url: &str,
        api_token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.filter(|token| !token.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and unwrap the `{ success, ... }` envelope.
    ///
    /// A 404 maps to `NotFound` only for job-scoped calls (`job_id` set).
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        job_id: Option<&str>,
    ) -> Result<T, ApiError> {
        let result = self.execute_inner(request, job_id).await;
        if let Err(e) = &result {
            metrics::counter!("remote_api_errors_total", "kind" => e.kind()).increment(1);
        }
        result
    }

    async fn execute_inner<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        job_id: Option<&str>,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            if let Some(job_id) = job_id {
                return Err(ApiError::NotFound(job_id.to_string()));
            }
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            return Err(ApiError::Rejected(
                envelope.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(envelope.body)
    }
}

#[async_trait::async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn create_job(&self, query: &str) -> Result<String, ApiError> {
        let request = self
            .request(Method::POST, "/search-jobs")
            .query(&[("query", query)]);
        let body: CreatedBody = self.execute(request, None).await?;
        body.job_id
            .ok_or_else(|| ApiError::Malformed("create response is missing job_id".to_string()))
    }

    async fn list_jobs(&self) -> Result<Vec<SearchJob>, ApiError> {
        let body: JobsBody = self
            .execute(self.request(Method::GET, "/search-jobs"), None)
            .await?;
        Ok(body.jobs)
    }

    async fn job_candidates(&self, job_id: &str) -> Result<Vec<Candidate>, ApiError> {
        let request = self.request(Method::GET, &format!("/search-jobs/{job_id}"));
        let body: CandidatesBody = self.execute(request, Some(job_id)).await?;
        Ok(body.candidates)
    }

    async fn pause_job(&self, job_id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &format!("/search-jobs/{job_id}/pause"));
        self.execute::<Empty>(request, Some(job_id)).await?;
        Ok(())
    }

    async fn resume_job(&self, job_id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &format!("/search-jobs/{job_id}/resume"));
        self.execute::<Empty>(request, Some(job_id)).await?;
        Ok(())
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), ApiError> {
        // Any non-2xx here, 404 included, is a hard failure.
        let request = self.request(Method::DELETE, &format!("/search-jobs/{job_id}"));
        self.execute::<Empty>(request, None).await?;
        Ok(())
    }

    async fn filter_count(&self, job_id: &str) -> Result<u64, ApiError> {
        let request = self
            .request(Method::GET, "/outreach/reapply-memory-filter/count")
            .query(&[("job_id", job_id)]);
        let body: CountBody = self.execute(request, Some(job_id)).await?;
        Ok(body.total)
    }

    async fn filter_batch(&self, job_id: &str) -> Result<FilterBatch, ApiError> {
        let request = self
            .request(Method::POST, "/outreach/reapply-memory-filter/batch")
            .query(&[("job_id", job_id)]);
        self.execute(request, Some(job_id)).await
    }

    async fn suggestions(&self, job_id: &str) -> Result<Vec<String>, ApiError> {
        let request = self.request(Method::GET, &format!("/search-jobs/{job_id}/suggestions"));
        let body: SuggestionsBody = self.execute(request, Some(job_id)).await?;
        Ok(body.suggestions)
    }

    async fn track_pass(&self, event: &PassEvent) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, "/outreach/track-pass")
            .json(event);
        self.execute::<Empty>(request, None).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed API response: {0}")]
    Malformed(String),

    #[error("search job {0} no longer exists")]
    NotFound(String),

    #[error("server error: HTTP {0}")]
    Status(u16),

    #[error("request rejected: {0}")]
    Rejected(String),
}

impl ApiError {
    /// Label used for the `remote_api_errors_total` metric.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport",
            ApiError::Parse(_) | ApiError::Malformed(_) => "parse",
            ApiError::NotFound(_) => "not_found",
            ApiError::Status(_) => "status",
            ApiError::Rejected(_) => "rejected",
        }
    }

    /// `success: false` in an otherwise well-formed 2xx response.
    pub fn is_soft(&self) -> bool {
        matches!(self, ApiError::Rejected(_))
    }
}
