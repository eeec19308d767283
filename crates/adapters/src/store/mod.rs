// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable store interfaces for runs and scripts

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sm_core::{Run, RunId, RunStatus, ScriptId, ScriptSpec, TriggerSource};
use std::path::Path;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    #[error("script not found: {0}")]
    ScriptNotFound(ScriptId),
    #[error("illegal run transition: {0}")]
    InvalidTransition(#[from] sm_core::RunStateError),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Durable table of run metadata.
///
/// The store serializes its own writes; the core assumes one
/// coordinator owns one run and does not implement optimistic
/// concurrency beyond that.
#[async_trait]
pub trait RunStore: Clone + Send + Sync + 'static {
    /// Create a run record in pending status, returning it with its id
    async fn create_run(
        &self,
        script_id: &ScriptId,
        triggered_by: TriggerSource,
        payload: Option<String>,
    ) -> Result<Run, StoreError>;

    /// Record where the run's log lives. Written as soon as the log
    /// sink is opened, before the spawn attempt, so diagnostic output
    /// from a run that never started is still reachable.
    async fn set_log_path(&self, run_id: &RunId, log_path: &Path) -> Result<(), StoreError>;

    /// Record that the process spawned
    async fn mark_running(
        &self,
        run_id: &RunId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Record the terminal outcome; rejects a second terminal write
    async fn mark_terminal(
        &self,
        run_id: &RunId,
        status: RunStatus,
        exit_code: Option<i32>,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn get_run(&self, run_id: &RunId) -> Result<Option<Run>, StoreError>;

    /// Most recent runs for a script, newest first
    async fn list_runs(&self, script_id: &ScriptId, limit: usize) -> Result<Vec<Run>, StoreError>;
}

/// Read-only script descriptor accessor plus the one write the core
/// performs on scripts: the "last run" timestamp.
#[async_trait]
pub trait ScriptStore: Clone + Send + Sync + 'static {
    async fn get_script(&self, script_id: &ScriptId) -> Result<Option<ScriptSpec>, StoreError>;

    /// Resolve an inbound webhook token to its script
    async fn script_by_webhook_token(&self, token: &str)
        -> Result<Option<ScriptSpec>, StoreError>;

    /// Scripts with an enabled schedule and a cron expression, for
    /// seeding the schedule registry at boot
    async fn list_scheduled(&self) -> Result<Vec<ScriptSpec>, StoreError>;

    async fn set_last_run(&self, script_id: &ScriptId, at: DateTime<Utc>)
        -> Result<(), StoreError>;
}
