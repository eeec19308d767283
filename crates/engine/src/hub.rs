// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output broadcast hub: durable plus live delivery per run
//!
//! Every published chunk is appended to the run's log file before it is
//! fanned out, so persistence never depends on subscriber behavior.
//! Subscribers get live tail semantics: chunks from the attach point
//! forward, then a single end-of-stream marker. Delivery uses one
//! unbounded channel per subscriber, so a slow consumer cannot stall
//! the producing process or its peers.

use sm_core::RunId;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;

/// One delivered item on a subscriber stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// A chunk of combined stdout/stderr, one line
    Chunk(String),
    /// End of stream; nothing follows
    Done,
}

/// Receiver side of a subscription
pub type OutputReceiver = mpsc::UnboundedReceiver<OutputEvent>;

/// Errors from the durable sink
#[derive(Debug, Error)]
pub enum HubError {
    #[error("failed to open log sink: {0}")]
    Io(#[from] std::io::Error),
}

struct RunChannel {
    sink: File,
    subscribers: Vec<mpsc::UnboundedSender<OutputEvent>>,
}

/// Per-run fan-out of output chunks, keyed by run id.
///
/// Cheap to clone; clones share state. Channels exist only while a run
/// is in flight.
#[derive(Clone, Default)]
pub struct OutputHub {
    channels: Arc<Mutex<HashMap<RunId, RunChannel>>>,
}

impl OutputHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the durable sink for a run, creating parent directories
    pub fn open(&self, run_id: &RunId, log_path: &Path) -> Result<(), HubError> {
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let sink = File::create(log_path)?;

        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.insert(
            run_id.clone(),
            RunChannel {
                sink,
                subscribers: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append a chunk to the durable sink, then deliver it to every
    /// attached subscriber. Ordering is preserved; closed subscribers
    /// are pruned.
    pub fn publish(&self, run_id: &RunId, chunk: &str) {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let Some(channel) = channels.get_mut(run_id) else {
            tracing::warn!(run_id = %run_id, "publish on unopened run channel");
            return;
        };

        if let Err(e) = writeln!(channel.sink, "{}", chunk) {
            tracing::error!(run_id = %run_id, error = %e, "log sink write failed");
        }

        channel
            .subscribers
            .retain(|tx| tx.send(OutputEvent::Chunk(chunk.to_string())).is_ok());
    }

    /// Attach a live-tail subscriber.
    ///
    /// If the run is not in flight (finished or never started), the
    /// receiver yields `Done` immediately and nothing else.
    pub fn subscribe(&self, run_id: &RunId) -> OutputReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        match channels.get_mut(run_id) {
            Some(channel) => channel.subscribers.push(tx),
            None => {
                let _ = tx.send(OutputEvent::Done);
            }
        }
        rx
    }

    /// Close out a run: flush the sink, signal end-of-stream to every
    /// subscriber, release the channel. Idempotent.
    pub fn complete(&self, run_id: &RunId) {
        let channel = {
            let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
            channels.remove(run_id)
        };
        let Some(mut channel) = channel else { return };

        if let Err(e) = channel.sink.flush() {
            tracing::error!(run_id = %run_id, error = %e, "log sink flush failed");
        }
        for tx in channel.subscribers {
            let _ = tx.send(OutputEvent::Done);
        }
    }

    /// Whether the run currently has an open channel
    pub fn is_open(&self, run_id: &RunId) -> bool {
        self.channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(run_id)
    }

    /// Count of channels currently in flight
    pub fn open_count(&self) -> usize {
        self.channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Full persisted log text for a finished or in-progress run
pub fn read_log(path: &Path) -> std::io::Result<String> {
    fs::read_to_string(path)
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
