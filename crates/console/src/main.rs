// crates/console/src/main.rs
//! signal-desk console binary.
//!
//! Thin CLI over the orchestration core: trigger a workflow task and watch
//! it to completion, print the status of in-flight jobs, or stream updates
//! until interrupted. All the real logic lives in
//! `signal-desk-orchestrator`; this file is wiring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use signal_desk_api::{ApiConfig, HttpJobsApi};
use signal_desk_orchestrator::{
    status::status_line, OrchestratorConfig, TaskEvent, TaskOrchestrator, TriggerOutcome,
};
use signal_desk_types::{TaskKey, TaskKind};

#[derive(Parser)]
#[command(name = "signal-desk", about = "Console for the signal-desk job queue")]
struct Cli {
    /// Backend base URL. Overrides the SIGNAL_DESK_API_URL env var.
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trigger a workflow task and watch it until it finishes.
    Trigger {
        /// Task kind, e.g. fetch-subscriptions or classify-tweets.
        task: String,
        /// Report profile id (report-profile only).
        #[arg(long)]
        profile: Option<String>,
        /// Tag (embedding-cache-refresh-tag only).
        #[arg(long)]
        tag: Option<String>,
    },
    /// Hydrate and print the status of every observed task.
    Status,
    /// Hydrate and stream job updates until interrupted.
    Watch,
}

/// Poll cadence from SIGNAL_DESK_POLL_MS, defaulting to the reference
/// 4000 ms.
fn poll_interval() -> Duration {
    std::env::var("SIGNAL_DESK_POLL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(4000))
}

fn api_config(cli: &Cli) -> ApiConfig {
    let mut config = ApiConfig::default();
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let api = Arc::new(HttpJobsApi::new(api_config(&cli))?);
    let orch = TaskOrchestrator::new(
        api,
        OrchestratorConfig {
            poll_interval: poll_interval(),
            ..OrchestratorConfig::default()
        },
    );

    match cli.command {
        Command::Trigger { task, profile, tag } => {
            let kind =
                TaskKind::parse(&task).ok_or_else(|| anyhow!("unknown task kind: {task}"))?;
            let mut params = serde_json::Map::new();
            if let Some(profile) = profile {
                params.insert("profileId".into(), profile.into());
            }
            if let Some(tag) = tag {
                params.insert("tag".into(), tag.into());
            }
            run_trigger(&orch, kind, serde_json::Value::Object(params)).await
        }
        Command::Status => run_status(&orch).await,
        Command::Watch => run_watch(&orch).await,
    }
}

async fn run_trigger(
    orch: &TaskOrchestrator<HttpJobsApi>,
    kind: TaskKind,
    params: serde_json::Value,
) -> Result<()> {
    let key = TaskKey::for_request(kind, &params)
        .ok_or_else(|| anyhow!("{kind} needs --profile or --tag"))?;
    let mut rx = orch.subscribe();

    match orch.trigger(kind, params).await? {
        TriggerOutcome::Started(job) => println!("{key}: started job {}", job.id),
        TriggerOutcome::Attached(job) => println!("{key}: attached to running job {}", job.id),
        TriggerOutcome::Skipped(_) => {
            println!("{key}: {}", status_line(orch.slot(&key).as_ref()));
            return Ok(());
        }
    }

    // Follow our key until its loop ends.
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            Err(e) => {
                // Missed events are recoverable; the slot holds the
                // latest state.
                tracing::warn!("event stream lagged: {e}");
                continue;
            }
        };
        if event.key() != &key {
            continue;
        }
        match event {
            TaskEvent::Update { .. } => {
                println!("{key}: {}", status_line(orch.slot(&key).as_ref()));
            }
            TaskEvent::Terminal { .. } => {
                println!("{key}: {}", status_line(orch.slot(&key).as_ref()));
                break;
            }
            TaskEvent::PollFailed { message, .. } => {
                println!("{key}: status query failed: {message}");
                break;
            }
            TaskEvent::Skipped { .. } => break,
        }
    }
    orch.shutdown();
    Ok(())
}

async fn run_status(orch: &TaskOrchestrator<HttpJobsApi>) -> Result<()> {
    orch.hydrate().await?;
    let slots = orch.slots();
    if slots.is_empty() {
        println!("no observed jobs");
    }
    for (key, slot) in &slots {
        println!("{key}: {}", status_line(Some(slot)));
    }
    orch.shutdown();
    Ok(())
}

async fn run_watch(orch: &TaskOrchestrator<HttpJobsApi>) -> Result<()> {
    let mut rx = orch.subscribe();
    let adopted = orch.hydrate().await?;
    println!("watching {adopted} in-flight job(s); ctrl-c to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => match event {
                Ok(event) => {
                    let key = event.key().clone();
                    match event {
                        TaskEvent::PollFailed { message, .. } => {
                            println!("{key}: status query failed: {message}");
                        }
                        _ => println!("{key}: {}", status_line(orch.slot(&key).as_ref())),
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                Err(e) => tracing::warn!("event stream lagged: {e}"),
            },
        }
    }
    orch.shutdown();
    Ok(())
}
