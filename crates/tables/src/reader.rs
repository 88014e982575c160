//! Accepted-event stream reader.
//!
//! One JSON object per line, as emitted by the upstream validator. The
//! validator owns field-level well-formedness; a row that still fails to
//! decode here is a contract violation and fails the whole run with the
//! offending line number.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use engine_core::{AcceptedEvent, Error, Result};
use tracing::info;
use validator::Validate;

/// Read the full accepted event set in ingestion order.
pub fn read_accepted_events(path: &Path) -> Result<Vec<AcceptedEvent>> {
    let file = File::open(path).map_err(|e| {
        Error::config(format!("cannot open input {}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);

    let mut events = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: AcceptedEvent = serde_json::from_str(trimmed)
            .map_err(|e| Error::contract(line_no, e.to_string()))?;

        event
            .validate()
            .map_err(|e| Error::contract(line_no, e.to_string()))?;

        events.push(event);
    }

    info!(count = events.len(), input = %path.display(), "Accepted events loaded");
    Ok(events)
}
