//! Change notifications for the enhancement log
//!
//! Views subscribe and recompute their own derived data when the log
//! changes. Lagging receivers lose old events; they should recompute from
//! the current log rather than replay.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// A change to the enhancement log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogEvent {
    /// A record was appended
    Appended { id: String },
    /// Records were imported in bulk
    Imported { count: usize },
    /// All records were removed
    Cleared,
    /// The log was replaced from storage
    Loaded { count: usize },
}

/// Broadcast sender shared by the log
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LogEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.tx.subscribe()
    }

    /// Publish to current subscribers; with none, the event is dropped
    pub fn publish(&self, event: LogEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
