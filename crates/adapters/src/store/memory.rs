// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for tests and single-process deployments

use super::{RunStore, ScriptStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sm_core::{Run, RunId, RunStatus, ScriptId, ScriptSpec, TriggerSource};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    scripts: HashMap<ScriptId, ScriptSpec>,
    runs: HashMap<RunId, Run>,
}

/// In-memory implementation of [`RunStore`] and [`ScriptStore`].
///
/// Enforces the run state machine on writes, the way a relational
/// backend would via status checks.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a script descriptor
    pub fn put_script(&self, spec: ScriptSpec) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.scripts.insert(spec.id.clone(), spec);
    }

    pub fn remove_script(&self, script_id: &ScriptId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.scripts.remove(script_id);
    }

    pub fn run_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.runs.len()
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn create_run(
        &self,
        script_id: &ScriptId,
        triggered_by: TriggerSource,
        payload: Option<String>,
    ) -> Result<Run, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.scripts.contains_key(script_id) {
            return Err(StoreError::ScriptNotFound(script_id.clone()));
        }
        let run = Run::pending(
            RunId::new(uuid::Uuid::new_v4().to_string()),
            script_id.clone(),
            triggered_by,
            payload,
            Utc::now(),
        );
        inner.runs.insert(run.id.clone(), run.clone());
        Ok(run)
    }

    async fn set_log_path(&self, run_id: &RunId, log_path: &Path) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let run = inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.clone()))?;
        run.set_log_path(log_path.to_path_buf());
        Ok(())
    }

    async fn mark_running(
        &self,
        run_id: &RunId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let run = inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.clone()))?;
        run.mark_running(started_at)?;
        Ok(())
    }

    async fn mark_terminal(
        &self,
        run_id: &RunId,
        status: RunStatus,
        exit_code: Option<i32>,
        finished_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let run = inner
            .runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.clone()))?;
        run.mark_terminal(status, exit_code, finished_at)?;
        Ok(())
    }

    async fn get_run(&self, run_id: &RunId) -> Result<Option<Run>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.runs.get(run_id).cloned())
    }

    async fn list_runs(&self, script_id: &ScriptId, limit: usize) -> Result<Vec<Run>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut runs: Vec<Run> = inner
            .runs
            .values()
            .filter(|r| &r.script_id == script_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs.truncate(limit);
        Ok(runs)
    }
}

#[async_trait]
impl ScriptStore for MemoryStore {
    async fn get_script(&self, script_id: &ScriptId) -> Result<Option<ScriptSpec>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.scripts.get(script_id).cloned())
    }

    async fn script_by_webhook_token(
        &self,
        token: &str,
    ) -> Result<Option<ScriptSpec>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .scripts
            .values()
            .find(|s| s.webhook_token.as_deref() == Some(token))
            .cloned())
    }

    async fn list_scheduled(&self) -> Result<Vec<ScriptSpec>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .scripts
            .values()
            .filter(|s| s.schedule_enabled && s.schedule_cron.is_some())
            .cloned()
            .collect())
    }

    async fn set_last_run(
        &self,
        script_id: &ScriptId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let script = inner
            .scripts
            .get_mut(script_id)
            .ok_or_else(|| StoreError::ScriptNotFound(script_id.clone()))?;
        script.last_run = Some(at);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
