// crates/types/src/job.rs
//! Backend job snapshots as they appear on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a backend job. Wire format is SCREAMING_SNAKE_CASE
/// (`"PENDING"`, `"RUNNING"`, `"COMPLETED"`, `"FAILED"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// A terminal status ends the polling loop for the job's task key.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// Point-in-time snapshot of a backend queue job.
///
/// The client never mutates a `Job`; a newer snapshot replaces the old one
/// wholesale in the task slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    /// Raw job type string. Recognized values parse into
    /// [`crate::TaskKind`]; hydration ignores anything else.
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub max_attempts: u32,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_json() -> &'static str {
        r#"{
            "id": "j1",
            "type": "classify-tweets",
            "status": "RUNNING",
            "attempts": 1,
            "maxAttempts": 3,
            "scheduledAt": "2026-08-01T12:00:00Z",
            "lockedAt": "2026-08-01T12:00:05Z",
            "payload": {"batch": 4}
        }"#
    }

    #[test]
    fn test_job_deserialize_wire_format() {
        let job: Job = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(job.id, "j1");
        assert_eq!(job.job_type, "classify-tweets");
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.attempts, 1);
        assert_eq!(job.max_attempts, 3);
        assert!(job.locked_at.is_some());
        assert!(job.completed_at.is_none());
        assert!(job.last_error.is_none());
        assert_eq!(job.payload["batch"], 4);
    }

    #[test]
    fn test_job_optional_fields_default() {
        let job: Job = serde_json::from_str(
            r#"{"id":"j2","type":"fetch-subscriptions","status":"PENDING",
                "scheduledAt":"2026-08-01T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_attempts, 0);
        assert!(job.payload.is_null());
    }

    #[test]
    fn test_status_wire_strings() {
        for (status, wire) in [
            (JobStatus::Pending, "\"PENDING\""),
            (JobStatus::Running, "\"RUNNING\""),
            (JobStatus::Completed, "\"COMPLETED\""),
            (JobStatus::Failed, "\"FAILED\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), wire);
            let back: JobStatus = serde_json::from_str(wire).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_status_terminality() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let res: Result<JobStatus, _> = serde_json::from_str("\"CANCELLED\"");
        assert!(res.is_err());
    }
}
