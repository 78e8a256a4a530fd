// crates/orchestrator/src/orchestrator.rs
//! Central orchestrator owning the key→{slot, handle} map.
//!
//! One tokio task per actively polled task key. All slot mutations happen
//! under the map lock, after checking the loop's cancellation token — the
//! same lock a superseding trigger or teardown uses to cancel that token —
//! so a response that loses the race is discarded, never applied.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use signal_desk_api::{ApiError, EnqueueReply, JobListFilter, JobsApi};
use signal_desk_types::{Job, SkipInfo, TaskKey, TaskKind, TaskSlot};

use crate::events::TaskEvent;
use crate::poll::{self, PollEffect, PollInput, PollPhase};

/// Reference poll cadence: next query fires this long after the previous
/// one *completed*.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(4000);

/// Orchestrator tuning knobs.
pub struct OrchestratorConfig {
    pub poll_interval: Duration,
    /// How many recent jobs hydration asks the backend for.
    pub hydrate_limit: u32,
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            hydrate_limit: 50,
            event_capacity: 256,
        }
    }
}

/// Errors surfaced by [`TaskOrchestrator::trigger`] and
/// [`TaskOrchestrator::discard`].
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The enqueue request failed. Transient; the existing slot is kept.
    #[error("enqueue failed: {0}")]
    Enqueue(#[from] ApiError),

    #[error("task {kind} requires a `{field}` parameter")]
    MissingTarget {
        kind: TaskKind,
        field: &'static str,
    },

    /// `discard` was called while a poll loop still observes the key.
    #[error("cannot discard {0}: a poll loop is still observing it")]
    Busy(TaskKey),

    #[error("nothing to discard for {0}")]
    NothingToDiscard(TaskKey),

    #[error("delete failed: {0}")]
    Delete(#[source] ApiError),

    /// The orchestrator was torn down; build a fresh one to trigger again.
    #[error("orchestrator is shut down")]
    ShutDown,
}

/// What a successful trigger did.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// The server created a new job.
    Started(Job),
    /// The server deduplicated against an already-running job; we now
    /// observe that job. Success, not an error.
    Attached(Job),
    /// The server declined to enqueue anything.
    Skipped(SkipInfo),
}

/// Live observation of one job. At most one per task key; installing a new
/// handle cancels the previous one under the map lock.
struct PollHandle {
    token: CancellationToken,
    job_id: String,
}

#[derive(Default)]
struct TaskEntry {
    slot: Option<TaskSlot>,
    handle: Option<PollHandle>,
}

enum Adoption {
    Started,
    Attached,
}

/// Drives the backend job queue: triggers tasks, polls status, and tears
/// down without leaking timers or applying stale responses.
pub struct TaskOrchestrator<A: JobsApi + 'static> {
    api: Arc<A>,
    tasks: Arc<RwLock<HashMap<TaskKey, TaskEntry>>>,
    /// Liveness token. Every handle token is a child, so cancelling this
    /// one tears down every loop.
    root: CancellationToken,
    events: broadcast::Sender<TaskEvent>,
    config: OrchestratorConfig,
}

impl<A: JobsApi + 'static> TaskOrchestrator<A> {
    pub fn new(api: Arc<A>, config: OrchestratorConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            api,
            tasks: Arc::new(RwLock::new(HashMap::new())),
            root: CancellationToken::new(),
            events,
            config,
        }
    }

    /// Subscribe to slot updates (for the presentation layer).
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Current slot for a key, if any.
    pub fn slot(&self, key: &TaskKey) -> Option<TaskSlot> {
        self.tasks
            .read()
            .ok()
            .and_then(|g| g.get(key).and_then(|e| e.slot.clone()))
    }

    /// All populated slots, ordered by key for stable display.
    pub fn slots(&self) -> Vec<(TaskKey, TaskSlot)> {
        let mut out: Vec<(TaskKey, TaskSlot)> = match self.tasks.read() {
            Ok(g) => g
                .iter()
                .filter_map(|(k, e)| e.slot.clone().map(|s| (k.clone(), s)))
                .collect(),
            Err(e) => {
                tracing::error!("task map lock poisoned: {e}");
                Vec::new()
            }
        };
        out.sort_by_key(|(k, _)| k.to_string());
        out
    }

    /// Whether a live poll loop exists for the key.
    pub fn is_polling(&self, key: &TaskKey) -> bool {
        self.polling_job(key).is_some()
    }

    /// Job id the key's live loop is observing, if any.
    pub fn polling_job(&self, key: &TaskKey) -> Option<String> {
        self.tasks.read().ok().and_then(|g| {
            g.get(key).and_then(|e| {
                e.handle
                    .as_ref()
                    .filter(|h| !h.token.is_cancelled())
                    .map(|h| h.job_id.clone())
            })
        })
    }

    /// Start-or-attach for a workflow task.
    ///
    /// The server is authoritative on deduplication: `created=false`
    /// adopts the returned job as the observation target. A skip reply
    /// populates the slot with [`SkipInfo`] and starts nothing. On request
    /// failure the existing slot is untouched.
    pub async fn trigger(
        &self,
        kind: TaskKind,
        params: serde_json::Value,
    ) -> Result<TriggerOutcome, TriggerError> {
        if self.root.is_cancelled() {
            return Err(TriggerError::ShutDown);
        }
        let key = match TaskKey::for_request(kind, &params) {
            Some(key) => key,
            None => {
                let field = kind.target_field().unwrap_or("target");
                return Err(TriggerError::MissingTarget { kind, field });
            }
        };

        match self.api.enqueue(kind, params).await? {
            EnqueueReply::Skipped(skip) => {
                tracing::info!(task_key = %key, reason = %skip.reason, pending = skip.pending, "enqueue skipped");
                if !self.apply_skip(&key, skip.clone()) {
                    return Err(TriggerError::ShutDown);
                }
                Ok(TriggerOutcome::Skipped(skip))
            }
            EnqueueReply::Enqueued(outcome) => {
                tracing::info!(
                    task_key = %key,
                    job_id = %outcome.job.id,
                    created = outcome.created,
                    "task enqueued"
                );
                if self.adopt(key, outcome.job.clone()).is_none() {
                    return Err(TriggerError::ShutDown);
                }
                if outcome.created {
                    Ok(TriggerOutcome::Started(outcome.job))
                } else {
                    Ok(TriggerOutcome::Attached(outcome.job))
                }
            }
        }
    }

    /// Recover observation of in-flight jobs after a fresh start, without
    /// re-triggering them. Adopts every PENDING/RUNNING job with a
    /// recognized task key; everything else is ignored. Returns how many
    /// new poll loops were started (attaching to an already-observed job
    /// counts zero, so hydrating twice is harmless).
    pub async fn hydrate(&self) -> Result<usize, ApiError> {
        if self.root.is_cancelled() {
            return Ok(0);
        }
        let jobs = self
            .api
            .list_jobs(JobListFilter::with_limit(self.config.hydrate_limit))
            .await?;
        let mut started = 0;
        for job in jobs {
            if job.status.is_terminal() {
                continue;
            }
            let Some(key) = TaskKey::from_job(&job) else {
                tracing::debug!(job_id = %job.id, job_type = %job.job_type, "hydration ignoring unrecognized job");
                continue;
            };
            match self.adopt(key, job) {
                Some(Adoption::Started) => started += 1,
                Some(Adoption::Attached) => {}
                // Torn down while the list request was in flight.
                None => return Ok(started),
            }
        }
        tracing::info!(adopted = started, "hydration complete");
        Ok(started)
    }

    /// Stop observing a key. The slot keeps its last value.
    pub fn stop(&self, key: &TaskKey) {
        let mut guard = match self.tasks.write() {
            Ok(g) => g,
            Err(e) => {
                tracing::error!("task map lock poisoned: {e}");
                return;
            }
        };
        if let Some(entry) = guard.get_mut(key) {
            if let Some(handle) = entry.handle.take() {
                handle.token.cancel();
                tracing::debug!(task_key = %key, "polling stopped");
            }
        }
    }

    /// Tear down every loop. Responses still in flight observe their
    /// cancelled token and apply nothing. Slots stay readable.
    pub fn shutdown(&self) {
        self.root.cancel();
        match self.tasks.write() {
            Ok(mut guard) => {
                for entry in guard.values_mut() {
                    entry.handle = None;
                }
            }
            Err(e) => tracing::error!("task map lock poisoned: {e}"),
        }
        tracing::info!("orchestrator shut down");
    }

    /// Delete a terminal job server-side and clear the key's slot. Refuses
    /// while a poll loop still observes the key.
    pub async fn discard(&self, key: &TaskKey) -> Result<(), TriggerError> {
        let job_id = {
            let guard = match self.tasks.read() {
                Ok(g) => g,
                Err(e) => {
                    tracing::error!("task map lock poisoned: {e}");
                    return Err(TriggerError::NothingToDiscard(key.clone()));
                }
            };
            let Some(entry) = guard.get(key) else {
                return Err(TriggerError::NothingToDiscard(key.clone()));
            };
            if entry.handle.is_some() {
                return Err(TriggerError::Busy(key.clone()));
            }
            match &entry.slot {
                Some(TaskSlot::Job(job)) => job.id.clone(),
                _ => return Err(TriggerError::NothingToDiscard(key.clone())),
            }
        };

        self.api
            .delete_job(&job_id)
            .await
            .map_err(TriggerError::Delete)?;

        if let Ok(mut guard) = self.tasks.write() {
            // A trigger may have raced in; only clear a still-idle entry.
            if guard.get(key).is_some_and(|e| e.handle.is_none()) {
                guard.remove(key);
            }
        }
        tracing::info!(task_key = %key, job_id = %job_id, "job discarded");
        Ok(())
    }

    /// Returns false when the reply lost a race with teardown and was
    /// discarded without touching state.
    fn apply_skip(&self, key: &TaskKey, skip: SkipInfo) -> bool {
        {
            let mut guard = match self.tasks.write() {
                Ok(g) => g,
                Err(e) => {
                    tracing::error!("task map lock poisoned: {e}");
                    return false;
                }
            };
            // Teardown happens under this same lock; a skip reply that
            // resolves afterwards must not mutate or emit.
            if self.root.is_cancelled() {
                tracing::debug!(task_key = %key, "skip reply discarded after shutdown");
                return false;
            }
            let entry = guard.entry(key.clone()).or_default();
            if let Some(handle) = entry.handle.take() {
                handle.token.cancel();
            }
            entry.slot = Some(TaskSlot::Skipped(skip.clone()));
        }
        // No subscribers is fine.
        let _ = self.events.send(TaskEvent::Skipped {
            key: key.clone(),
            skip,
        });
        true
    }

    /// Make `job` the observation target for `key`. If a live loop for the
    /// key already observes this exact job id, attach to it — the snapshot
    /// is applied but no second loop is created. Otherwise the previous
    /// handle (if any) is cancelled and a fresh loop installed, both under
    /// the map lock. Returns `None` when the snapshot lost a race with
    /// teardown and was discarded.
    fn adopt(&self, key: TaskKey, job: Job) -> Option<Adoption> {
        let token = {
            let mut guard = match self.tasks.write() {
                Ok(g) => g,
                Err(e) => {
                    tracing::error!("task map lock poisoned: {e}");
                    return Some(Adoption::Attached);
                }
            };
            // Teardown cancels the root under this same lock; a snapshot
            // arriving afterwards must not mutate or emit.
            if self.root.is_cancelled() {
                tracing::debug!(task_key = %key, job_id = %job.id, "snapshot discarded after shutdown");
                return None;
            }
            let entry = guard.entry(key.clone()).or_default();
            if let Some(handle) = &entry.handle {
                if handle.job_id == job.id && !handle.token.is_cancelled() {
                    entry.slot = Some(TaskSlot::Job(job.clone()));
                    drop(guard);
                    let _ = self.events.send(TaskEvent::Update { key, job });
                    return Some(Adoption::Attached);
                }
            }
            if let Some(old) = entry.handle.take() {
                old.token.cancel();
            }
            let token = self.root.child_token();
            entry.handle = Some(PollHandle {
                token: token.clone(),
                job_id: job.id.clone(),
            });
            entry.slot = Some(TaskSlot::Job(job.clone()));
            token
        };
        let _ = self.events.send(TaskEvent::Update {
            key: key.clone(),
            job: job.clone(),
        });
        self.spawn_poll_loop(key, job.id, token);
        Some(Adoption::Started)
    }

    fn spawn_poll_loop(&self, key: TaskKey, job_id: String, token: CancellationToken) {
        let api = Arc::clone(&self.api);
        let tasks = Arc::clone(&self.tasks);
        let events = self.events.clone();
        let interval = self.config.poll_interval;
        tokio::spawn(async move {
            tracing::debug!(task_key = %key, job_id = %job_id, "poll loop started");
            let mut phase = PollPhase::Polling {
                job_id: job_id.clone(),
            };
            loop {
                let input = tokio::select! {
                    _ = token.cancelled() => return,
                    result = api.get_job(&job_id) => match result {
                        Ok(job) => PollInput::Snapshot(job),
                        Err(e) => PollInput::QueryFailed(e.to_string()),
                    },
                };

                let (next, effects) = poll::step(phase, input);
                phase = next;

                let mut schedule_next = false;
                {
                    let mut guard = match tasks.write() {
                        Ok(g) => g,
                        Err(e) => {
                            tracing::error!("task map lock poisoned: {e}");
                            return;
                        }
                    };
                    // A superseding trigger or teardown cancels this token
                    // under this same lock; checking here makes a late
                    // response inert.
                    if token.is_cancelled() {
                        return;
                    }
                    let Some(entry) = guard.get_mut(&key) else { return };
                    for effect in effects {
                        match effect {
                            PollEffect::EmitUpdate(job) => {
                                entry.slot = Some(TaskSlot::Job(job.clone()));
                                let _ = events.send(TaskEvent::Update {
                                    key: key.clone(),
                                    job,
                                });
                            }
                            PollEffect::EmitTerminal(job) => {
                                entry.handle = None;
                                tracing::info!(
                                    task_key = %key,
                                    job_id = %job.id,
                                    status = job.status.as_str(),
                                    "job reached terminal status"
                                );
                                let _ = events.send(TaskEvent::Terminal {
                                    key: key.clone(),
                                    job,
                                });
                            }
                            PollEffect::EmitError(message) => {
                                entry.handle = None;
                                tracing::warn!(
                                    task_key = %key,
                                    job_id = %job_id,
                                    "status query failed: {message}"
                                );
                                let _ = events.send(TaskEvent::PollFailed {
                                    key: key.clone(),
                                    message,
                                });
                            }
                            PollEffect::ScheduleNext => schedule_next = true,
                        }
                    }
                }

                if !schedule_next {
                    return;
                }
                // Measured from completion of the query above, so a slow
                // query can never pile up overlapping requests.
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });
    }
}
