// crates/types/src/slot.rs
//! Per-key observation state: slots, skips, and enqueue outcomes.

use serde::{Deserialize, Serialize};

use crate::job::Job;

/// A backend decision not to enqueue anything: no pending work, or the
/// pending count is below the configured threshold. Structurally distinct
/// from both a job and an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipInfo {
    pub reason: String,
    pub pending: u64,
    #[serde(default)]
    pub threshold: Option<u64>,
}

/// What a task key currently holds. Absence of a slot means the key has
/// never been triggered and nothing was hydrated for it.
///
/// A terminal (completed/failed) job stays in its slot until the next
/// trigger overwrites it — the dashboard keeps showing the last outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskSlot {
    Job(Job),
    Skipped(SkipInfo),
}

impl TaskSlot {
    pub fn job(&self) -> Option<&Job> {
        match self {
            Self::Job(job) => Some(job),
            Self::Skipped(_) => None,
        }
    }

    pub fn skip(&self) -> Option<&SkipInfo> {
        match self {
            Self::Job(_) => None,
            Self::Skipped(skip) => Some(skip),
        }
    }
}

/// Result of a successful enqueue request. `created == false` means the
/// server deduplicated the request against an already-running job and the
/// returned snapshot is that job — success, not an error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueOutcome {
    pub job: Job,
    pub created: bool,
    #[serde(default)]
    pub message: Option<String>,
}
