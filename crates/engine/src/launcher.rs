// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process launcher: interpreter resolution, spawn, output streaming,
//! timeout enforcement
//!
//! Spawning and waiting are split so the coordinator can flip the run
//! to `running` only once the OS process is confirmed started. Output
//! chunks (lines, stdout and stderr merged) are forwarded through an
//! unbounded sender as they arrive; nothing is buffered whole.

use sm_core::Language;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

/// Sender for output chunk delivery
pub type OutputSender = mpsc::UnboundedSender<String>;

/// Errors before a process exists
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("custom language requires an explicit interpreter")]
    MissingInterpreter,
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Terminal result of one launch. Exactly one is produced per spawned
/// process, even under timeout-triggered kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Process exited on its own; code is -1 when killed by a signal
    Exited { code: i32 },
    /// Timeout elapsed and the process was force-killed
    TimedOut,
}

/// A fully resolved command line plus environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment entries on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl LaunchRequest {
    /// Resolve the interpreter command line for a script
    pub fn for_script(
        language: Language,
        interpreter: Option<&str>,
        script_path: &Path,
        env: Vec<(String, String)>,
    ) -> Result<Self, LaunchError> {
        let (program, args) = resolve_interpreter(language, interpreter, script_path)?;
        Ok(Self { program, args, env })
    }
}

/// Resolve (program, args) for a language by platform convention.
///
/// `custom` requires the explicit interpreter from the script record.
pub fn resolve_interpreter(
    language: Language,
    interpreter: Option<&str>,
    script_path: &Path,
) -> Result<(String, Vec<String>), LaunchError> {
    let script = script_path.display().to_string();
    match language {
        Language::Python => {
            let cmd = if cfg!(windows) { "python" } else { "python3" };
            Ok((cmd.to_string(), vec![script]))
        }
        Language::Node => Ok(("node".to_string(), vec![script])),
        Language::Shell => {
            if cfg!(windows) {
                Ok(("cmd".to_string(), vec!["/c".to_string(), script]))
            } else {
                Ok(("bash".to_string(), vec![script]))
            }
        }
        Language::Custom => interpreter
            .map(|i| (i.to_string(), vec![script]))
            .ok_or(LaunchError::MissingInterpreter),
    }
}

/// Spawn the process. Success means the OS process started.
pub fn spawn(request: &LaunchRequest) -> Result<RunningScript, LaunchError> {
    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &request.env {
        cmd.env(key, value);
    }

    let child = cmd.spawn().map_err(|e| LaunchError::Spawn {
        program: request.program.clone(),
        source: e,
    })?;

    tracing::debug!(program = %request.program, "process spawned");
    Ok(RunningScript { child })
}

/// A spawned script process whose outcome has not been decided yet
#[derive(Debug)]
pub struct RunningScript {
    child: Child,
}

impl RunningScript {
    /// Stream merged stdout/stderr lines into `output` until the
    /// process exits or the timeout fires, then return the outcome.
    ///
    /// On timeout the process is force-killed (`kill_on_drop` covers
    /// the error paths) and pending readers are cancelled; output
    /// already delivered remains valid.
    pub async fn wait(mut self, timeout: Duration, output: OutputSender) -> LaunchOutcome {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();
        let out_task = tokio::spawn(forward_lines(stdout, output.clone()));
        let err_task = tokio::spawn(forward_lines(stderr, output));

        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                // Drain remaining buffered output before reporting
                let _ = out_task.await;
                let _ = err_task.await;
                LaunchOutcome::Exited {
                    code: status.code().unwrap_or(-1),
                }
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "failed waiting on child process");
                out_task.abort();
                err_task.abort();
                LaunchOutcome::Exited { code: -1 }
            }
            Err(_elapsed) => {
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
                out_task.abort();
                err_task.abort();
                LaunchOutcome::TimedOut
            }
        }
    }
}

async fn forward_lines<R>(reader: Option<R>, output: OutputSender)
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else { return };
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        // Receiver dropped means nobody is listening anymore
        if output.send(line).is_err() {
            break;
        }
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
