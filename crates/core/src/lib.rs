// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sm-core: Core library for the Script Mill (sm) execution subsystem
//!
//! This crate provides:
//! - The run lifecycle state machine (pending -> running -> terminal)
//! - Script execution descriptors and parameter resolution
//! - Cron schedule parsing and next-fire computation
//! - Webhook token generation and HMAC signature verification
//! - A clock abstraction for testable time handling

pub mod clock;
pub mod run;
pub mod schedule;
pub mod script;
pub mod webhook;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use run::{Run, RunId, RunStateError, RunStatus, TriggerSource};
pub use schedule::{next_fire_time, ScheduleError};
pub use script::{Language, ParamError, ParamKind, ScriptId, ScriptParameter, ScriptSpec};
