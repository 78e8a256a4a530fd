// crates/api/src/lib.rs
//! Typed client for the backend job-queue API.
//!
//! Provides:
//! - [`JobsApi`] — the trait the orchestrator polls through
//! - [`HttpJobsApi`] — the reqwest implementation
//! - [`ApiError`] — transport / HTTP-status / decode taxonomy

pub mod client;
pub mod error;

pub use client::{ApiConfig, EnqueueReply, HttpJobsApi, JobListFilter, JobsApi};
pub use error::ApiError;
