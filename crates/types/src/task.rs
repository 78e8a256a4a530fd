// crates/types/src/task.rs
//! Task kinds and task keys.
//!
//! A [`TaskKind`] is one of the seven workflow job types the backend knows
//! about. A [`TaskKey`] identifies one triggerable workflow *instance*: for
//! most kinds the kind alone, for per-profile and per-tag kinds the kind
//! plus a target id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::job::Job;

/// The workflow task kinds the dashboard can trigger and observe.
///
/// Wire format is the kebab-case job type string. Job types outside this
/// enum exist on the backend but are invisible to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    FetchSubscriptions,
    ClassifyTweets,
    ClassifyTweetsDispatch,
    ClassifyTweetsLlm,
    ReportProfile,
    EmbeddingCacheRefresh,
    EmbeddingCacheRefreshTag,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchSubscriptions => "fetch-subscriptions",
            Self::ClassifyTweets => "classify-tweets",
            Self::ClassifyTweetsDispatch => "classify-tweets-dispatch",
            Self::ClassifyTweetsLlm => "classify-tweets-llm",
            Self::ReportProfile => "report-profile",
            Self::EmbeddingCacheRefresh => "embedding-cache-refresh",
            Self::EmbeddingCacheRefreshTag => "embedding-cache-refresh-tag",
        }
    }

    /// Parse a wire job type string. Returns `None` for unrecognized types.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fetch-subscriptions" => Some(Self::FetchSubscriptions),
            "classify-tweets" => Some(Self::ClassifyTweets),
            "classify-tweets-dispatch" => Some(Self::ClassifyTweetsDispatch),
            "classify-tweets-llm" => Some(Self::ClassifyTweetsLlm),
            "report-profile" => Some(Self::ReportProfile),
            "embedding-cache-refresh" => Some(Self::EmbeddingCacheRefresh),
            "embedding-cache-refresh-tag" => Some(Self::EmbeddingCacheRefreshTag),
            _ => None,
        }
    }

    /// The payload field that scopes this kind to a target, if any.
    /// `report-profile` runs per report profile, `embedding-cache-refresh-tag`
    /// per tag; every other kind is a singleton.
    pub fn target_field(&self) -> Option<&'static str> {
        match self {
            Self::ReportProfile => Some("profileId"),
            Self::EmbeddingCacheRefreshTag => Some("tag"),
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logical slot identifying one triggerable workflow instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskKey {
    pub kind: TaskKind,
    /// Profile id / tag for the per-target kinds; `None` for singletons.
    pub target: Option<String>,
}

impl TaskKey {
    /// Singleton key for a kind without a target.
    pub fn of(kind: TaskKind) -> Self {
        Self { kind, target: None }
    }

    /// Key for a per-target kind.
    pub fn scoped(kind: TaskKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: Some(target.into()),
        }
    }

    /// Derive the key for a trigger request from its params. Per-target
    /// kinds read their target field from the params object; returns `None`
    /// when that field is missing or not a string.
    pub fn for_request(kind: TaskKind, params: &serde_json::Value) -> Option<Self> {
        match kind.target_field() {
            None => Some(Self::of(kind)),
            Some(field) => params
                .get(field)
                .and_then(|v| v.as_str())
                .map(|target| Self::scoped(kind, target)),
        }
    }

    /// Derive the key a job snapshot belongs to. Returns `None` for jobs
    /// whose type the dashboard does not recognize, or whose payload lacks
    /// the target field — hydration skips both.
    pub fn from_job(job: &Job) -> Option<Self> {
        let kind = TaskKind::parse(&job.job_type)?;
        Self::for_request(kind, &job.payload)
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}:{}", self.kind, target),
            None => write!(f, "{}", self.kind),
        }
    }
}
