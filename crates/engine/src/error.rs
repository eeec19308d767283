// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the execution engine

use sm_adapters::StoreError;
use sm_core::{ParamError, RunId, ScheduleError, ScriptId};
use thiserror::Error;

/// Errors surfaced synchronously by a trigger call.
///
/// Anything that happens after the run record exists resolves into the
/// run's terminal status instead of an error to the caller.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("parameter validation failed: {0}")]
    Validation(#[from] ParamError),
    #[error("script not found: {0}")]
    ScriptNotFound(ScriptId),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the webhook trigger path
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("unknown webhook token")]
    UnknownToken,
    #[error("webhook signature verification failed")]
    BadSignature,
    #[error(transparent)]
    Trigger(#[from] TriggerError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from schedule registration
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleError),
    #[error("script has no schedule expression: {0}")]
    NotScheduled(ScriptId),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from reading persisted run output
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),
    #[error("run has no log yet: {0}")]
    NoLog(RunId),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("failed to read log: {0}")]
    Io(#[from] std::io::Error),
}
