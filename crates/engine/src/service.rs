// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The [`Engine`] facade: the one surface callers hold
//!
//! Bundles the store, output hub, run coordinator, and schedule
//! registry behind the handful of operations an API layer needs.
//! Cloning an Engine is cheap and every clone shares the same state,
//! so a server can hand one to each request handler.

use crate::config::EngineConfig;
use crate::coordinator::RunCoordinator;
use crate::error::{OutputError, RegistryError, TriggerError, WebhookError};
use crate::hub::{self, OutputHub, OutputReceiver};
use crate::registry::ScheduleRegistry;
use sm_adapters::{RunStore, ScriptStore};
use sm_core::{webhook, Run, RunId, ScriptId, ScriptSpec, SystemClock, TriggerSource};
use std::collections::HashMap;

/// Script execution service over a store backend
#[derive(Clone)]
pub struct Engine<S> {
    store: S,
    hub: OutputHub,
    coordinator: RunCoordinator<S, SystemClock>,
    registry: ScheduleRegistry<S, SystemClock>,
}

impl<S> Engine<S>
where
    S: RunStore + ScriptStore,
{
    pub fn new(store: S, config: EngineConfig) -> Self {
        let hub = OutputHub::new();
        let coordinator =
            RunCoordinator::new(store.clone(), hub.clone(), config, SystemClock);
        let registry = ScheduleRegistry::new(coordinator.clone(), store.clone());
        Self {
            store,
            hub,
            coordinator,
            registry,
        }
    }

    /// User-initiated run with explicitly provided parameter values
    pub async fn trigger_manual(
        &self,
        script_id: &ScriptId,
        params: &HashMap<String, String>,
    ) -> Result<RunId, TriggerError> {
        self.coordinator
            .trigger(script_id, TriggerSource::Manual, params, None)
            .await
    }

    /// Inbound webhook call: resolve the token, verify the signature
    /// when the script demands one, and run with declared defaults.
    ///
    /// The raw payload is stored on the run record for inspection; it
    /// does not feed parameter resolution.
    pub async fn trigger_webhook(
        &self,
        token: &str,
        payload: Option<String>,
        signature: Option<&str>,
    ) -> Result<RunId, WebhookError> {
        let spec = self
            .store
            .script_by_webhook_token(token)
            .await?
            .ok_or(WebhookError::UnknownToken)?;

        if spec.require_webhook_signature {
            let verified = match (spec.webhook_secret.as_deref(), signature) {
                (Some(secret), Some(signature)) => {
                    webhook::verify_signature(secret, payload.as_deref().unwrap_or(""), signature)
                }
                _ => false,
            };
            if !verified {
                tracing::warn!(script_id = %spec.id, "webhook signature rejected");
                return Err(WebhookError::BadSignature);
            }
        }

        let run_id = self
            .coordinator
            .trigger(&spec.id, TriggerSource::Webhook, &HashMap::new(), payload)
            .await?;
        Ok(run_id)
    }

    /// Arm timers for every stored script with an enabled schedule.
    /// Called once at boot; returns how many were registered.
    pub async fn seed_schedules(&self) -> Result<usize, RegistryError> {
        self.registry.seed().await
    }

    /// Reconcile the registry after a schedule edit: register when the
    /// script has an enabled schedule, otherwise tear its timer down.
    pub fn apply_schedule(&self, spec: &ScriptSpec) -> Result<bool, RegistryError> {
        if spec.schedule_enabled && spec.schedule_cron.is_some() {
            self.registry.register(spec)?;
            Ok(true)
        } else {
            self.registry.unregister(&spec.id);
            Ok(false)
        }
    }

    /// Live-tail subscription to a run's output. A finished or unknown
    /// run yields end-of-stream immediately.
    pub fn subscribe(&self, run_id: &RunId) -> OutputReceiver {
        self.hub.subscribe(run_id)
    }

    /// Whether the run currently has an open output channel
    pub fn output_open(&self, run_id: &RunId) -> bool {
        self.hub.is_open(run_id)
    }

    /// Full persisted output of a run, from its log file
    pub async fn run_output(&self, run_id: &RunId) -> Result<String, OutputError> {
        let run = self
            .store
            .get_run(run_id)
            .await?
            .ok_or_else(|| OutputError::RunNotFound(run_id.clone()))?;
        let log_path = run
            .log_path
            .as_ref()
            .ok_or_else(|| OutputError::NoLog(run_id.clone()))?;
        Ok(hub::read_log(log_path)?)
    }

    pub async fn run(&self, run_id: &RunId) -> Result<Option<Run>, TriggerError> {
        Ok(self.store.get_run(run_id).await?)
    }

    /// Most recent runs for a script, newest first
    pub async fn run_history(
        &self,
        script_id: &ScriptId,
        limit: usize,
    ) -> Result<Vec<Run>, TriggerError> {
        Ok(self.store.list_runs(script_id, limit).await?)
    }

    pub fn schedule_active(&self, script_id: &ScriptId) -> bool {
        self.registry.active(script_id)
    }

    /// Cancel all schedule timers. In-flight runs finish on their own.
    pub fn shutdown(&self) {
        self.registry.shutdown();
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
