//! Lifecycle events consumed by the timing accumulator
//!
//! The orchestrator delivers these in play/task nesting order; target-level
//! events may interleave arbitrarily across targets within a task. A recorded
//! stream can also be replayed from a JSON-lines log.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::snapshot::{iso8601, TargetStatus, Timestamp};

/// One lifecycle event, tagged on the wire as
/// `{"event": "play_start", "name": ..., "id": ..., "at": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    PlayStart {
        name: String,
        id: String,
        #[serde(with = "iso8601")]
        at: Timestamp,
    },
    TaskStart {
        name: String,
        id: String,
        #[serde(with = "iso8601")]
        at: Timestamp,
    },
    /// A target began executing (dispatch), distinct from its result arriving
    TargetStart {
        host: String,
        #[serde(with = "iso8601")]
        at: Timestamp,
    },
    TargetComplete {
        host: String,
        #[serde(with = "iso8601")]
        at: Timestamp,
        #[serde(default)]
        status: TargetStatus,
        #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
        metadata: serde_json::Map<String, serde_json::Value>,
    },
}

/// Read a JSON-lines event log; blank lines are skipped
pub fn read_event_log(path: &Path) -> Result<Vec<RunEvent>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read event log {}", path.display()))?;

    let mut events = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: RunEvent = serde_json::from_str(line)
            .with_context(|| format!("malformed event at {}:{}", path.display(), lineno + 1))?;
        events.push(event);
    }
    Ok(events)
}
