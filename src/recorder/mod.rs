// Append-only audit log of cycle steps, tool executions and manual overrides

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogKind {
    Tool,
    Info,
    Action,
    Packet,
}

/// Immutable audit record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    /// UUIDv7 (time-ordered)
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Session log.
///
/// Entries are only ever appended. Each append is also broadcast to live
/// subscribers; no subscribers is fine.
pub struct LogRecorder {
    entries: Vec<LogEntry>,
    tx: broadcast::Sender<LogEntry>,
}

impl LogRecorder {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            entries: Vec::new(),
            tx,
        }
    }

    /// Append an entry with a fresh id and the current time
    pub fn append(
        &mut self,
        kind: LogKind,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> &LogEntry {
        let entry = LogEntry {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            data,
        };

        let _ = self.tx.send(entry.clone());
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Entries oldest-first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subscribe to entries appended from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }

    /// Start a new session log. Existing subscribers stay attached.
    pub fn start_session(&mut self) {
        self.entries = Vec::new();
    }
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new()
    }
}
