// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule registry: one recurring timer per scheduled script
//!
//! Each registered script gets a background task that sleeps until the
//! schedule's next fire time, triggers an unattended run, and re-arms.
//! Registration is idempotent; re-registering replaces the prior timer
//! so an edited expression takes effect immediately. The script record
//! is re-read at every fire, so a script disabled after registration
//! stops producing runs even before its timer is torn down.

use crate::coordinator::RunCoordinator;
use crate::error::RegistryError;
use sm_adapters::{RunStore, ScriptStore};
use sm_core::schedule::{self, Schedule};
use sm_core::{Clock, ScriptId, ScriptSpec, TriggerSource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Holds the live timer task per scheduled script
#[derive(Clone)]
pub struct ScheduleRegistry<S, C> {
    coordinator: RunCoordinator<S, C>,
    store: S,
    jobs: Arc<Mutex<HashMap<ScriptId, JoinHandle<()>>>>,
}

impl<S, C> ScheduleRegistry<S, C>
where
    S: RunStore + ScriptStore,
    C: Clock,
{
    pub fn new(coordinator: RunCoordinator<S, C>, store: S) -> Self {
        Self {
            coordinator,
            store,
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register (or replace) the recurring timer for a script.
    ///
    /// Validates the expression before touching any existing timer, so
    /// a bad edit leaves the old schedule running.
    pub fn register(&self, spec: &ScriptSpec) -> Result<(), RegistryError> {
        let expr = spec
            .schedule_cron
            .as_deref()
            .ok_or_else(|| RegistryError::NotScheduled(spec.id.clone()))?;
        let schedule = schedule::parse(expr)?;

        let handle = self.spawn_timer(spec.id.clone(), schedule);
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(old) = jobs.insert(spec.id.clone(), handle) {
            old.abort();
        }
        tracing::info!(script_id = %spec.id, cron = %expr, "schedule registered");
        Ok(())
    }

    /// Tear down the timer for a script; returns whether one existed
    pub fn unregister(&self, script_id: &ScriptId) -> bool {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        match jobs.remove(script_id) {
            Some(handle) => {
                handle.abort();
                tracing::info!(script_id = %script_id, "schedule unregistered");
                true
            }
            None => false,
        }
    }

    /// Register every stored script with an enabled schedule.
    ///
    /// An invalid stored expression is logged and skipped so one bad
    /// record cannot block boot. Returns the number registered.
    pub async fn seed(&self) -> Result<usize, RegistryError> {
        let scheduled = self.store.list_scheduled().await?;
        let mut count = 0;
        for spec in scheduled {
            match self.register(&spec) {
                Ok(()) => count += 1,
                Err(e) => {
                    tracing::warn!(script_id = %spec.id, error = %e, "skipping unloadable schedule");
                }
            }
        }
        Ok(count)
    }

    pub fn active(&self, script_id: &ScriptId) -> bool {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(script_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every timer. Runs already in flight are unaffected.
    pub fn shutdown(&self) {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in jobs.drain() {
            handle.abort();
        }
    }

    fn spawn_timer(&self, script_id: ScriptId, schedule: Schedule) -> JoinHandle<()> {
        let coordinator = self.coordinator.clone();
        let store = self.store.clone();
        let clock = self.coordinator.clock().clone();
        tokio::spawn(async move {
            loop {
                let now = clock.now();
                let Some(next) = schedule.after(&now).next() else {
                    tracing::info!(script_id = %script_id, "schedule has no future fires");
                    break;
                };
                let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
                tokio::time::sleep(delay).await;

                match store.get_script(&script_id).await {
                    Ok(Some(current))
                        if current.schedule_enabled && current.schedule_cron.is_some() =>
                    {
                        let params = current.default_values();
                        if let Err(e) = coordinator
                            .trigger(&script_id, TriggerSource::Scheduler, &params, None)
                            .await
                        {
                            tracing::warn!(script_id = %script_id, error = %e, "scheduled trigger failed");
                        }
                    }
                    Ok(Some(_)) => {
                        tracing::debug!(script_id = %script_id, "schedule disabled, skipping fire");
                    }
                    Ok(None) => {
                        tracing::info!(script_id = %script_id, "script deleted, stopping schedule");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(script_id = %script_id, error = %e, "could not re-read script");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
