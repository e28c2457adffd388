//! JSON Lines event ingestion
//!
//! The instrumentation hook writes one JSON object per line; this is the
//! boundary between the inspected test suite and this crate. Timestamps are
//! seconds from any fixed origin, only the difference is used.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One raw instrumentation event as emitted by the hook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryEvent {
    /// Factory name, e.g. "user"
    pub factory: String,
    /// Strategy tag, e.g. "build" or "create"
    pub strategy: String,
    /// Call start, seconds
    pub start: f64,
    /// Call finish, seconds
    pub finish: f64,
    /// Frame identifiers active at the call, newest first. May arrive raw
    /// (full backtrace lines) when the hook does not filter; see `frames`.
    #[serde(default)]
    pub call_stack: Vec<String>,
}

/// Read a JSONL event stream. Blank lines are skipped; a malformed line
/// aborts ingestion with its line number.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<FactoryEvent>> {
    let mut events = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read event line {}", number + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: FactoryEvent = serde_json::from_str(&line)
            .with_context(|| format!("malformed event on line {}", number + 1))?;
        events.push(event);
    }
    debug!(events = events.len(), "ingested event stream");
    Ok(events)
}

/// Read events from a file path, or from stdin when `path` is `-`
pub fn read_events_from_path(path: &Path) -> Result<Vec<FactoryEvent>> {
    if path.as_os_str() == "-" {
        let stdin = io::stdin();
        return read_events(stdin.lock());
    }
    let file = File::open(path)
        .with_context(|| format!("cannot open event log {}", path.display()))?;
    read_events(BufReader::new(file))
        .with_context(|| format!("while reading {}", path.display()))
}
