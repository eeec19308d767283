// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron schedule parsing and next-fire computation
//!
//! Schedules are stored as standard 5-field cron expressions
//! (minute hour day-of-month month day-of-week). The cron crate parses
//! a 6/7-field grammar with a leading seconds column, so 5-field input
//! is normalized by prepending `0` seconds. 6-field expressions are
//! accepted as-is for sub-minute schedules.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use thiserror::Error;

pub use cron::Schedule;

/// Errors from schedule validation
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expr}': {reason}")]
    Invalid { expr: String, reason: String },
}

/// Parse and validate a cron expression
pub fn parse(expr: &str) -> Result<Schedule, ScheduleError> {
    let normalized = normalize(expr);
    Schedule::from_str(&normalized).map_err(|e| ScheduleError::Invalid {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

fn normalize(expr: &str) -> String {
    let trimmed = expr.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Next fire time strictly after `now`, or None for an invalid expression.
///
/// Pure function; used by the schedule registry to arm timers and by the
/// API layer to report "next run" to users.
pub fn next_fire_time(expr: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    parse(expr).ok()?.after(&now).next()
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
