// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external collaborators
//!
//! The execution core reads and writes run records and script
//! descriptors through the narrow [`store`] traits; any relational
//! store can sit behind them. [`store::MemoryStore`] is the in-process
//! implementation used by tests and single-user deployments.

pub mod store;

pub use store::{MemoryStore, RunStore, ScriptStore, StoreError};
