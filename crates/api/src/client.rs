// crates/api/src/client.rs
//! `JobsApi` trait and the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use signal_desk_types::{EnqueueOutcome, Job, JobStatus, SkipInfo, TaskKind};

use crate::error::ApiError;

/// Configuration for the HTTP client.
pub struct ApiConfig {
    /// Base URL of the backend (e.g. `http://127.0.0.1:8787`).
    /// `SIGNAL_DESK_API_URL` env var overrides the default.
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("SIGNAL_DESK_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8787".to_string()),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Filter for `listJobs`. All fields optional except the limit.
#[derive(Debug, Clone, Default)]
pub struct JobListFilter {
    pub job_type: Option<TaskKind>,
    pub status: Option<JobStatus>,
    pub limit: Option<u32>,
}

impl JobListFilter {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// A successful reply to an enqueue request: either a job (new or
/// deduplicated-attach) or a backend decision to skip.
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueReply {
    Enqueued(EnqueueOutcome),
    Skipped(SkipInfo),
}

/// The backend job-queue operations the orchestrator consumes.
///
/// Implementations: [`HttpJobsApi`] in production, scripted fakes in the
/// orchestrator's tests.
#[async_trait]
pub trait JobsApi: Send + Sync {
    /// Start-or-attach for a named workflow task. The server is
    /// authoritative on deduplication; the client performs no locking here.
    async fn enqueue(
        &self,
        kind: TaskKind,
        params: serde_json::Value,
    ) -> Result<EnqueueReply, ApiError>;

    /// Fetch a point-in-time snapshot of one job.
    async fn get_job(&self, id: &str) -> Result<Job, ApiError>;

    /// List recent jobs, newest first.
    async fn list_jobs(&self, filter: JobListFilter) -> Result<Vec<Job>, ApiError>;

    /// Delete a terminal job server-side.
    async fn delete_job(&self, id: &str) -> Result<(), ApiError>;
}

/// reqwest implementation of [`JobsApi`].
pub struct HttpJobsApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpJobsApi {
    /// Errors if the TLS backend cannot be initialized; the configured
    /// timeout is never silently dropped.
    pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Convert a non-2xx response into [`ApiError::Status`], reading the
    /// body for the error message.
    async fn check(url: &str, resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Wire shape of a skip reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSkip {
    skipped: bool,
    reason: String,
    pending: u64,
    #[serde(default)]
    threshold: Option<u64>,
}

/// Enqueue replies come in two shapes; untagged so serde picks by fields.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireEnqueue {
    Skip(WireSkip),
    Outcome(EnqueueOutcome),
}

#[async_trait]
impl JobsApi for HttpJobsApi {
    async fn enqueue(
        &self,
        kind: TaskKind,
        params: serde_json::Value,
    ) -> Result<EnqueueReply, ApiError> {
        let url = self.url("/api/jobs/enqueue");
        tracing::debug!(task_kind = %kind, "enqueue request");
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "type": kind, "params": params }))
            .send()
            .await
            .map_err(|e| ApiError::transport(url.clone(), e))?;
        let resp = Self::check(&url, resp).await?;
        let wire: WireEnqueue = resp
            .json()
            .await
            .map_err(|e| ApiError::decode(url.clone(), e))?;
        match wire {
            WireEnqueue::Outcome(outcome) => Ok(EnqueueReply::Enqueued(outcome)),
            WireEnqueue::Skip(skip) if skip.skipped => Ok(EnqueueReply::Skipped(SkipInfo {
                reason: skip.reason,
                pending: skip.pending,
                threshold: skip.threshold,
            })),
            WireEnqueue::Skip(_) => Err(ApiError::decode(url.clone(), "skip reply with skipped=false")),
        }
    }

    async fn get_job(&self, id: &str) -> Result<Job, ApiError> {
        let url = self.url(&format!("/api/jobs/{id}"));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(url.clone(), e))?;
        let resp = Self::check(&url, resp).await?;
        resp.json().await.map_err(|e| ApiError::decode(url.clone(), e))
    }

    async fn list_jobs(&self, filter: JobListFilter) -> Result<Vec<Job>, ApiError> {
        let url = self.url("/api/jobs");
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(kind) = filter.job_type {
            query.push(("type", kind.as_str().to_string()));
        }
        if let Some(status) = filter.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }
        let resp = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::transport(url.clone(), e))?;
        let resp = Self::check(&url, resp).await?;
        resp.json().await.map_err(|e| ApiError::decode(url.clone(), e))
    }

    async fn delete_job(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/api/jobs/{id}"));
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| ApiError::transport(url.clone(), e))?;
        Self::check(&url, resp).await?;
        Ok(())
    }
}
