// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sm-engine: script execution and scheduling
//!
//! The concurrent core of Script Mill:
//! - [`launcher`]: spawn an interpreter process, stream merged output,
//!   enforce the timeout
//! - [`hub`]: per-run broadcast of output chunks to a durable log sink
//!   and any number of live subscribers
//! - [`coordinator`]: the state machine driving one run from trigger to
//!   terminal status
//! - [`registry`]: one recurring timer per scheduled script
//! - [`service`]: the [`Engine`] facade owning the shared maps, with
//!   explicit construction and shutdown

pub mod config;
pub mod coordinator;
pub mod error;
pub mod hub;
pub mod launcher;
pub mod registry;
pub mod service;

pub use config::EngineConfig;
pub use coordinator::RunCoordinator;
pub use error::{OutputError, RegistryError, TriggerError, WebhookError};
pub use hub::{HubError, OutputEvent, OutputHub, OutputReceiver};
pub use launcher::{LaunchError, LaunchOutcome, LaunchRequest};
pub use registry::ScheduleRegistry;
pub use service::Engine;
