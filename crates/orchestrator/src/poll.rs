// crates/orchestrator/src/poll.rs
//! Pure state machine for one task key's polling loop.
//!
//! The transition function has no clock and no I/O; the executor in
//! [`crate::orchestrator`] feeds it query results and carries out the
//! effects it returns. This is what makes cancellation deterministic and
//! lets tests drive the loop with a virtual clock.

use signal_desk_types::Job;

/// Where one key's loop currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum PollPhase {
    /// No loop running (never started, stopped, or failed a query).
    Idle,
    /// Actively observing `job_id` on a fixed cadence.
    Polling { job_id: String },
    /// A terminal snapshot has been applied; the loop is over.
    Terminal { job: Job },
}

/// What the executor observed.
#[derive(Debug, Clone, PartialEq)]
pub enum PollInput {
    /// A status query succeeded with this snapshot.
    Snapshot(Job),
    /// A status query failed; the message is user-visible.
    QueryFailed(String),
}

/// What the executor must do next, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEffect {
    /// Apply the snapshot to the slot and notify subscribers.
    EmitUpdate(Job),
    /// The snapshot was terminal: notify once, then stop.
    EmitTerminal(Job),
    /// A query failed: surface the message, keep the last slot, stop.
    EmitError(String),
    /// Schedule the next query after the poll interval.
    ScheduleNext,
}

/// Advance the machine by one observed input.
///
/// Every snapshot produces an update effect; a terminal snapshot
/// additionally produces exactly one terminal effect and no reschedule.
/// Inputs arriving in `Idle` or `Terminal` are late stragglers and
/// produce nothing.
pub fn step(phase: PollPhase, input: PollInput) -> (PollPhase, Vec<PollEffect>) {
    match (phase, input) {
        (PollPhase::Polling { .. }, PollInput::Snapshot(job)) => {
            if job.status.is_terminal() {
                (
                    PollPhase::Terminal { job: job.clone() },
                    vec![PollEffect::EmitUpdate(job.clone()), PollEffect::EmitTerminal(job)],
                )
            } else {
                (
                    PollPhase::Polling {
                        job_id: job.id.clone(),
                    },
                    vec![PollEffect::EmitUpdate(job), PollEffect::ScheduleNext],
                )
            }
        }
        (PollPhase::Polling { .. }, PollInput::QueryFailed(message)) => {
            (PollPhase::Idle, vec![PollEffect::EmitError(message)])
        }
        // Late inputs after the loop ended apply nothing.
        (phase @ (PollPhase::Idle | PollPhase::Terminal { .. }), _) => (phase, vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_desk_types::JobStatus;

    fn job(id: &str, status: JobStatus) -> Job {
        Job {
            id: id.into(),
            job_type: "classify-tweets".into(),
            status,
            attempts: 1,
            max_attempts: 3,
            scheduled_at: chrono::Utc::now(),
            locked_at: None,
            completed_at: None,
            last_error: None,
            payload: serde_json::Value::Null,
        }
    }

    fn polling(id: &str) -> PollPhase {
        PollPhase::Polling { job_id: id.into() }
    }

    #[test]
    fn test_running_snapshot_updates_and_reschedules() {
        let snap = job("j1", JobStatus::Running);
        let (next, effects) = step(polling("j1"), PollInput::Snapshot(snap.clone()));
        assert_eq!(next, polling("j1"));
        assert_eq!(
            effects,
            vec![PollEffect::EmitUpdate(snap), PollEffect::ScheduleNext]
        );
    }

    #[test]
    fn test_terminal_snapshot_fires_terminal_once_and_stops() {
        let snap = job("j1", JobStatus::Completed);
        let (next, effects) = step(polling("j1"), PollInput::Snapshot(snap.clone()));
        assert_eq!(next, PollPhase::Terminal { job: snap.clone() });
        assert_eq!(
            effects,
            vec![
                PollEffect::EmitUpdate(snap.clone()),
                PollEffect::EmitTerminal(snap.clone())
            ]
        );

        // A straggler arriving after terminal applies nothing.
        let (next, effects) = step(next, PollInput::Snapshot(job("j1", JobStatus::Running)));
        assert_eq!(next, PollPhase::Terminal { job: snap });
        assert!(effects.is_empty());
    }

    #[test]
    fn test_failed_snapshot_is_terminal() {
        let snap = job("j1", JobStatus::Failed);
        let (next, effects) = step(polling("j1"), PollInput::Snapshot(snap.clone()));
        assert_eq!(next, PollPhase::Terminal { job: snap.clone() });
        assert!(effects.contains(&PollEffect::EmitTerminal(snap)));
    }

    #[test]
    fn test_query_failure_goes_idle_with_no_reschedule() {
        let (next, effects) = step(polling("j1"), PollInput::QueryFailed("timeout".into()));
        assert_eq!(next, PollPhase::Idle);
        assert_eq!(effects, vec![PollEffect::EmitError("timeout".into())]);
        assert!(!effects.contains(&PollEffect::ScheduleNext));
    }

    #[test]
    fn test_idle_ignores_inputs() {
        let (next, effects) = step(
            PollPhase::Idle,
            PollInput::Snapshot(job("j1", JobStatus::Running)),
        );
        assert_eq!(next, PollPhase::Idle);
        assert!(effects.is_empty());

        let (next, effects) = step(PollPhase::Idle, PollInput::QueryFailed("late".into()));
        assert_eq!(next, PollPhase::Idle);
        assert!(effects.is_empty());
    }
}
