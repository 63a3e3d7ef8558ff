//! Status broadcast over a bounded tokio channel.
//!
//! Sends never block: slow subscribers lag and drop old events, and having no
//! subscribers at all is not an error.

use log::debug;
use pgk_core::{StatusNotifier, SyncStatus, SYNC_STATUS_TOPIC};
use serde::Serialize;
use tokio::sync::broadcast;

pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    pub topic: &'static str,
    pub status: SyncStatus,
}

#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<StatusEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl StatusNotifier for BroadcastNotifier {
    fn notify(&self, status: &SyncStatus) -> Result<(), String> {
        let event = StatusEvent {
            topic: SYNC_STATUS_TOPIC,
            status: status.clone(),
        };
        if self.tx.send(event).is_err() {
            debug!("no {} subscribers", SYNC_STATUS_TOPIC);
        }
        Ok(())
    }
}
