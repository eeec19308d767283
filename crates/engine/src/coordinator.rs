// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run coordinator: drives one run from trigger to terminal status
//!
//! `trigger` validates and creates the run record, then hands off to a
//! background task and returns the run id immediately. Everything after
//! the record exists resolves into the run's terminal status rather
//! than an error to the caller, so a crashing script and a script that
//! never spawned both leave an inspectable record behind.

use crate::config::EngineConfig;
use crate::error::TriggerError;
use crate::hub::OutputHub;
use crate::launcher::{self, LaunchOutcome, LaunchRequest};
use sm_adapters::{RunStore, ScriptStore};
use sm_core::{Clock, RunId, RunStatus, ScriptId, ScriptSpec, TriggerSource};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Coordinates run execution against a store and the output hub
#[derive(Clone)]
pub struct RunCoordinator<S, C> {
    store: S,
    hub: OutputHub,
    config: EngineConfig,
    clock: C,
}

impl<S, C> RunCoordinator<S, C>
where
    S: RunStore + ScriptStore,
    C: Clock,
{
    pub fn new(store: S, hub: OutputHub, config: EngineConfig, clock: C) -> Self {
        Self {
            store,
            hub,
            config,
            clock,
        }
    }

    pub fn hub(&self) -> &OutputHub {
        &self.hub
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Validate, create the run record, and start execution.
    ///
    /// Returns once the record exists; execution continues in the
    /// background. Validation failures create no record at all.
    pub async fn trigger(
        &self,
        script_id: &ScriptId,
        triggered_by: TriggerSource,
        params: &HashMap<String, String>,
        payload: Option<String>,
    ) -> Result<RunId, TriggerError> {
        let spec = self
            .store
            .get_script(script_id)
            .await?
            .ok_or_else(|| TriggerError::ScriptNotFound(script_id.clone()))?;

        let env = spec.resolve_params(params)?;

        let run = self
            .store
            .create_run(script_id, triggered_by, payload)
            .await?;
        let run_id = run.id.clone();

        tracing::info!(
            run_id = %run_id,
            script_id = %script_id,
            triggered_by = %triggered_by,
            "run triggered"
        );

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.drive(spec, run.id, env).await;
        });

        Ok(run_id)
    }

    /// Execute one run to its terminal status. Never returns an error:
    /// every failure mode lands in the run record and its log.
    async fn drive(&self, spec: ScriptSpec, run_id: RunId, env: Vec<(String, String)>) {
        let log_path = self.config.log_path(&spec, &run_id);
        if let Err(e) = self.hub.open(&run_id, &log_path) {
            tracing::error!(run_id = %run_id, error = %e, "could not open log sink");
            self.finish(&spec.id, &run_id, RunStatus::Failure, Some(-1))
                .await;
            return;
        }

        // The log location is recorded before the spawn attempt, so a
        // run that fails to start still points at its diagnostic log.
        if let Err(e) = self.store.set_log_path(&run_id, &log_path).await {
            tracing::error!(run_id = %run_id, error = %e, "could not record log path");
        }

        let script_path = self.config.script_path(&spec);
        if !script_path.exists() {
            self.hub.publish(
                &run_id,
                &format!("script file not found: {}", script_path.display()),
            );
            self.finish(&spec.id, &run_id, RunStatus::Failure, Some(-1))
                .await;
            return;
        }

        let request = match LaunchRequest::for_script(
            spec.language,
            spec.interpreter.as_deref(),
            &script_path,
            env,
        ) {
            Ok(request) => request,
            Err(e) => {
                self.hub.publish(&run_id, &e.to_string());
                self.finish(&spec.id, &run_id, RunStatus::Failure, Some(-1))
                    .await;
                return;
            }
        };

        let running = match launcher::spawn(&request) {
            Ok(running) => running,
            Err(e) => {
                self.hub.publish(&run_id, &e.to_string());
                self.finish(&spec.id, &run_id, RunStatus::Failure, Some(-1))
                    .await;
                return;
            }
        };

        // The process is confirmed started; only now does the run show
        // as running.
        if let Err(e) = self.store.mark_running(&run_id, self.clock.now()).await {
            tracing::error!(run_id = %run_id, error = %e, "could not mark run running");
            drop(running); // kill_on_drop reaps the child
            self.finish(&spec.id, &run_id, RunStatus::Failure, Some(-1))
                .await;
            return;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let forwarder = {
            let hub = self.hub.clone();
            let run_id = run_id.clone();
            tokio::spawn(async move {
                while let Some(line) = rx.recv().await {
                    hub.publish(&run_id, &line);
                }
            })
        };

        let timeout = self.config.effective_timeout(&spec);
        let outcome = running.wait(timeout, tx).await;
        // All senders are gone once wait returns; join so every chunk
        // is in the sink before the terminal write.
        let _ = forwarder.await;

        let (status, exit_code) = match outcome {
            LaunchOutcome::Exited { code: 0 } => (RunStatus::Success, Some(0)),
            LaunchOutcome::Exited { code } => (RunStatus::Failure, Some(code)),
            LaunchOutcome::TimedOut => {
                self.hub.publish(
                    &run_id,
                    &format!(
                        "process killed after exceeding timeout of {}ms",
                        timeout.as_millis()
                    ),
                );
                (RunStatus::Timeout, None)
            }
        };

        self.finish(&spec.id, &run_id, status, exit_code).await;
    }

    /// Record the terminal outcome, close the output channel, and stamp
    /// the script's last-run time.
    async fn finish(
        &self,
        script_id: &ScriptId,
        run_id: &RunId,
        status: RunStatus,
        exit_code: Option<i32>,
    ) {
        let finished_at = self.clock.now();
        let mut result = self
            .store
            .mark_terminal(run_id, status, exit_code, finished_at)
            .await;
        if result.is_err() {
            // One retry covers transient backend trouble; an illegal
            // transition will fail identically and gets logged below.
            result = self
                .store
                .mark_terminal(run_id, status, exit_code, finished_at)
                .await;
        }
        if let Err(e) = result {
            tracing::error!(run_id = %run_id, status = %status, error = %e, "terminal write failed");
        }

        self.hub.complete(run_id);

        if let Err(e) = self.store.set_last_run(script_id, finished_at).await {
            tracing::warn!(script_id = %script_id, error = %e, "could not stamp last run");
        }

        tracing::info!(run_id = %run_id, status = %status, exit_code = ?exit_code, "run finished");
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
