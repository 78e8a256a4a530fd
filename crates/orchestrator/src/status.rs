// crates/orchestrator/src/status.rs
//! Human-readable status text for task slots.

use signal_desk_types::{JobStatus, TaskSlot};

/// One display line for a task slot. The presentation layer renders this
/// next to each task's trigger control.
pub fn status_line(slot: Option<&TaskSlot>) -> String {
    let Some(slot) = slot else {
        return "not started".to_string();
    };
    match slot {
        TaskSlot::Skipped(skip) => match skip.threshold {
            Some(threshold) => format!(
                "skipped: {} ({} pending, threshold {})",
                skip.reason, skip.pending, threshold
            ),
            None => format!("skipped: {} ({} pending)", skip.reason, skip.pending),
        },
        TaskSlot::Job(job) => match job.status {
            JobStatus::Pending => "queued".to_string(),
            JobStatus::Running => {
                format!("running (attempt {} of {})", job.attempts, job.max_attempts)
            }
            JobStatus::Completed => match job.completed_at {
                Some(at) => format!("completed at {}", at.to_rfc3339()),
                None => "completed".to_string(),
            },
            JobStatus::Failed => match &job.last_error {
                Some(err) => format!("failed: {err}"),
                None => "failed".to_string(),
            },
        },
    }
}
