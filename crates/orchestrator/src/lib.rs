// crates/orchestrator/src/lib.rs
//! Background-job orchestration for the signal-desk dashboard.
//!
//! Provides:
//! - [`TaskOrchestrator`] — owns the key→{slot, handle} map, triggers
//!   workflow tasks, polls job status, and tears down cleanly
//! - [`poll`] — the pure poll state machine
//! - [`status`] — human-readable status text for task slots
//! - [`tags`] — tag autocomplete helpers (pure string logic)
//!
//! Concurrency model: one tokio task per active task key, sharing no
//! mutable state except the map itself. Cancellation is cooperative — a
//! `CancellationToken` per handle (child of the orchestrator's root token)
//! is checked under the map lock before any state mutation, so in-flight
//! responses that lose a race with teardown or a superseding trigger are
//! discarded instead of applied.

pub mod events;
pub mod orchestrator;
pub mod poll;
pub mod status;
pub mod tags;

pub use events::TaskEvent;
pub use orchestrator::{
    OrchestratorConfig, TaskOrchestrator, TriggerError, TriggerOutcome,
};
