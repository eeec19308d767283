// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration: directories and the default timeout

use sm_core::{RunId, ScriptSpec};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-run timeout when neither the script nor the deployment
/// overrides it
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Directories and limits for the execution engine
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Directory holding stored script files
    pub scripts_dir: PathBuf,
    /// Directory holding per-run output logs
    pub logs_dir: PathBuf,
    /// Deployment-wide default timeout, overridable per script
    pub default_timeout: Duration,
}

impl EngineConfig {
    pub fn new(scripts_dir: impl Into<PathBuf>, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            logs_dir: logs_dir.into(),
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolve directories from `SM_SCRIPTS_DIR` / `SM_LOGS_DIR`,
    /// falling back to `user_scripts` and `run_logs` under the current
    /// directory. Relative env paths are anchored at the current
    /// directory as well.
    pub fn from_env() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(
            dir_from_env("SM_SCRIPTS_DIR", &cwd, "user_scripts"),
            dir_from_env("SM_LOGS_DIR", &cwd, "run_logs"),
        )
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Absolute location of a script's file
    pub fn script_path(&self, spec: &ScriptSpec) -> PathBuf {
        self.scripts_dir.join(&spec.filename)
    }

    /// Log location for one run: `<logs_dir>/<sanitized filename>/<run id>.log`
    pub fn log_path(&self, spec: &ScriptSpec, run_id: &RunId) -> PathBuf {
        self.logs_dir
            .join(sanitize(&spec.filename))
            .join(format!("{}.log", run_id))
    }

    /// Effective timeout for one run: script override, else the default
    pub fn effective_timeout(&self, spec: &ScriptSpec) -> Duration {
        spec.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout)
    }
}

fn dir_from_env(var: &str, cwd: &Path, fallback: &str) -> PathBuf {
    match std::env::var_os(var) {
        Some(dir) => {
            let dir = PathBuf::from(dir);
            if dir.is_absolute() {
                dir
            } else {
                cwd.join(dir)
            }
        }
        None => cwd.join(fallback),
    }
}

/// Replace anything outside `[a-zA-Z0-9_.-]` so a filename is safe as a
/// log directory component
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
