// crates/orchestrator/src/events.rs
//! Orchestrator events broadcast to presentation layers.

use signal_desk_types::{Job, SkipInfo, TaskKey};

/// One observation applied to a task slot.
///
/// Sent on a `tokio::sync::broadcast` channel; lagged subscribers miss
/// events but can always re-read the slots, which hold the latest state.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// A fresh (non-final) snapshot was applied to the key's slot.
    Update { key: TaskKey, job: Job },
    /// The job reached Completed or Failed; fired exactly once per loop.
    Terminal { key: TaskKey, job: Job },
    /// A status query failed and the key's loop ended. The slot keeps the
    /// last known snapshot.
    PollFailed { key: TaskKey, message: String },
    /// The backend declined to enqueue anything for this key.
    Skipped { key: TaskKey, skip: SkipInfo },
}

impl TaskEvent {
    pub fn key(&self) -> &TaskKey {
        match self {
            Self::Update { key, .. }
            | Self::Terminal { key, .. }
            | Self::PollFailed { key, .. }
            | Self::Skipped { key, .. } => key,
        }
    }
}
