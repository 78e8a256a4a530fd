// crates/types/src/lib.rs
//! Wire types shared across the signal-desk workspace.
//!
//! Everything here is a point-in-time snapshot of backend state. Jobs are
//! owned and mutated exclusively by the backend queue; the client only ever
//! replaces whole values, never edits them in place.

pub mod job;
pub mod slot;
pub mod task;

pub use job::{Job, JobStatus};
pub use slot::{EnqueueOutcome, SkipInfo, TaskSlot};
pub use task::{TaskKey, TaskKind};
