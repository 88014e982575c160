//! Identity stitching.
//!
//! Builds the device → person mapping from self-identification signals.
//! The most recent signal per device wins, and the mapping is
//! retroactive: all of a device's history joins to the resolved person,
//! including events before the identifying one.
//!
//! The mapping is single-direction only. Two devices that independently
//! self-identify with different emails never merge into one canonical
//! person; that incompleteness is accepted rather than papered over with
//! merge heuristics.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use engine_core::{IdentityRow, NormalizedEvent};

/// Immutable device → person mapping for one run.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    /// Devices resolved by an explicit signal.
    resolved: BTreeMap<String, String>,
    /// Every device observed in the batch.
    devices: BTreeSet<String>,
}

impl IdentityMap {
    /// Build the mapping from the full normalized event set.
    pub fn build(events: &[NormalizedEvent]) -> Self {
        // Latest signal per device: (event_time, ingest_index) ordering
        // so a correction later in the stream overrides.
        let mut latest: BTreeMap<&str, (DateTime<Utc>, usize, &str)> = BTreeMap::new();
        let mut devices = BTreeSet::new();

        for event in events {
            devices.insert(event.device_id.clone());

            if let Some(ref identifier) = event.self_identifier {
                let seen = (event.event_time, event.ingest_index);
                match latest.get(event.device_id.as_str()) {
                    Some((time, index, _)) if (*time, *index) >= seen => {}
                    _ => {
                        latest.insert(
                            &event.device_id,
                            (event.event_time, event.ingest_index, identifier.as_str()),
                        );
                    }
                }
            }
        }

        let resolved = latest
            .into_iter()
            .map(|(device, (_, _, person))| (device.to_string(), person.to_string()))
            .collect();

        Self { resolved, devices }
    }

    /// Resolve a device to its person identity.
    ///
    /// Devices without a self-identifying signal map to themselves.
    pub fn resolve<'a>(&'a self, device_id: &'a str) -> &'a str {
        self.resolved
            .get(device_id)
            .map(String::as_str)
            .unwrap_or(device_id)
    }

    /// Number of devices resolved by an explicit signal.
    pub fn stitched_count(&self) -> usize {
        self.resolved.len()
    }

    /// Number of distinct devices observed.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Materialize the identity_map table, one row per observed device.
    pub fn to_rows(&self) -> Vec<IdentityRow> {
        self.devices
            .iter()
            .map(|device_id| IdentityRow {
                device_id: device_id.clone(),
                person_id: self.resolve(device_id).to_string(),
            })
            .collect()
    }
}
