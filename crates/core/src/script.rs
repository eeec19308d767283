// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script execution descriptors and parameter resolution
//!
//! A ScriptSpec is the read-only view the execution core needs of a
//! stored script: where it lives, how to interpret it, and which
//! parameters it declares. Declared parameters are injected into the
//! child process environment under their declared names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Unique identifier for a script
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptId(pub String);

impl ScriptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ScriptId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ScriptId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Script language, determining the interpreter convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Node,
    Shell,
    /// Requires an explicit interpreter path on the script
    Custom,
}

/// Declared value type of a script parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

/// A parameter declared by a script, injected as an environment variable
/// named exactly as declared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptParameter {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ScriptParameter {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default_value: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Errors from parameter resolution
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("missing required parameters: {}", missing.join(", "))]
    MissingRequired { missing: Vec<String> },
}

/// Read-only execution descriptor for a script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSpec {
    pub id: ScriptId,
    pub name: String,
    /// Filename inside the scripts directory
    pub filename: String,
    pub language: Language,
    /// Explicit interpreter executable, required for Language::Custom
    #[serde(default)]
    pub interpreter: Option<String>,
    /// Per-script timeout override in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub parameters: Vec<ScriptParameter>,
    /// Cron-like recurring schedule, 5-field expression
    #[serde(default)]
    pub schedule_cron: Option<String>,
    #[serde(default)]
    pub schedule_enabled: bool,
    /// Shared-secret token mapping inbound webhook calls to this script
    #[serde(default)]
    pub webhook_token: Option<String>,
    /// Per-script secret for HMAC signature verification
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub require_webhook_signature: bool,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

impl ScriptSpec {
    pub fn new(id: ScriptId, name: impl Into<String>, filename: impl Into<String>, language: Language) -> Self {
        Self {
            id,
            name: name.into(),
            filename: filename.into(),
            language,
            interpreter: None,
            timeout_ms: None,
            parameters: Vec::new(),
            schedule_cron: None,
            schedule_enabled: false,
            webhook_token: None,
            webhook_secret: None,
            require_webhook_signature: false,
            last_run: None,
        }
    }

    /// Resolve final parameter values for a run.
    ///
    /// An explicitly provided value wins over the declared default.
    /// Values provided for undeclared parameters are ignored. Required
    /// parameters with neither a provided value nor a default fail
    /// resolution; every unresolved name is reported.
    pub fn resolve_params(
        &self,
        provided: &HashMap<String, String>,
    ) -> Result<Vec<(String, String)>, ParamError> {
        let mut resolved = Vec::new();
        let mut missing = Vec::new();

        for param in &self.parameters {
            match provided.get(&param.name).or(param.default_value.as_ref()) {
                Some(value) => resolved.push((param.name.clone(), value.clone())),
                None if param.required => missing.push(param.name.clone()),
                None => {}
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(ParamError::MissingRequired { missing })
        }
    }

    /// Parameter values for unattended runs: declared defaults only.
    ///
    /// Used by the schedule registry, where no interactive input exists.
    pub fn default_values(&self) -> HashMap<String, String> {
        self.parameters
            .iter()
            .filter_map(|p| {
                p.default_value
                    .as_ref()
                    .map(|v| (p.name.clone(), v.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
