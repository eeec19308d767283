// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run lifecycle state machine
//!
//! A Run is one execution attempt of a script. Its status moves strictly
//! pending -> running -> {success, failure, timeout} and never reverses.
//! A run that fails to spawn goes straight from pending to failure.

use crate::script::ScriptId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Unique identifier for a run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The current status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Record created, process not yet spawned
    Pending,
    /// Process spawned and producing output
    Running,
    /// Process exited with code 0
    Success,
    /// Process exited nonzero or failed to spawn
    Failure,
    /// Process exceeded its timeout and was killed
    Timeout,
}

impl RunStatus {
    /// Whether this status is terminal (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Failure | RunStatus::Timeout
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failure => "failure",
            RunStatus::Timeout => "timeout",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What caused a run to start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    /// User-initiated API call
    Manual,
    /// Inbound webhook call
    Webhook,
    /// Recurring schedule fire
    Scheduler,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriggerSource::Manual => "manual",
            TriggerSource::Webhook => "webhook",
            TriggerSource::Scheduler => "scheduler",
        };
        write!(f, "{}", s)
    }
}

/// Errors from illegal run state transitions
#[derive(Debug, Error, PartialEq)]
pub enum RunStateError {
    #[error("cannot transition run from {from} to {to}")]
    Invalid { from: RunStatus, to: RunStatus },
    #[error("terminal status required, got {0}")]
    NotTerminal(RunStatus),
}

/// One execution attempt of a script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub script_id: ScriptId,
    pub status: RunStatus,
    pub triggered_by: TriggerSource,
    pub created_at: DateTime<Utc>,
    /// Set when the process is confirmed spawned
    pub started_at: Option<DateTime<Utc>>,
    /// Set exactly once, when the run reaches a terminal status
    pub finished_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    /// Path to the persisted output log. Recorded when the log sink is
    /// opened, before the spawn attempt, so a run that fails to start
    /// still points at its diagnostic log.
    pub log_path: Option<PathBuf>,
    /// Optional trigger payload (e.g. webhook body)
    pub payload: Option<String>,
}

impl Run {
    /// Create a new run in pending status
    pub fn pending(
        id: RunId,
        script_id: ScriptId,
        triggered_by: TriggerSource,
        payload: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            script_id,
            status: RunStatus::Pending,
            triggered_by,
            created_at,
            started_at: None,
            finished_at: None,
            exit_code: None,
            log_path: None,
            payload,
        }
    }

    /// Record where the run's output log lives. Happens before the
    /// spawn attempt; valid in any non-terminal state.
    pub fn set_log_path(&mut self, path: PathBuf) {
        self.log_path = Some(path);
    }

    /// Mark the run as running once the process has spawned
    pub fn mark_running(&mut self, started_at: DateTime<Utc>) -> Result<(), RunStateError> {
        if self.status != RunStatus::Pending {
            return Err(RunStateError::Invalid {
                from: self.status,
                to: RunStatus::Running,
            });
        }
        self.status = RunStatus::Running;
        self.started_at = Some(started_at);
        Ok(())
    }

    /// Move the run to a terminal status, exactly once.
    ///
    /// Allowed from pending (spawn failure) or running; never from a
    /// terminal status.
    pub fn mark_terminal(
        &mut self,
        status: RunStatus,
        exit_code: Option<i32>,
        finished_at: DateTime<Utc>,
    ) -> Result<(), RunStateError> {
        if !status.is_terminal() {
            return Err(RunStateError::NotTerminal(status));
        }
        if self.status.is_terminal() {
            return Err(RunStateError::Invalid {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.exit_code = exit_code;
        self.finished_at = Some(finished_at);
        Ok(())
    }

    /// Whether the run has reached a terminal status
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
