//! Sessionization.
//!
//! Partitions each device's chronologically ordered event stream into
//! sessions separated by inactivity gaps of 30 minutes or more (a gap of
//! exactly 30:00 starts a new session). Sessions are time-disjoint, cover
//! the device's event set exactly, and are never split on purchases.
//! Traffic and device attributes are first-touch sticky: fixed by the
//! session's first event.

use std::collections::BTreeMap;

use engine_core::{ids, policy, EventType, NormalizedEvent, SessionRow};

use crate::identity::IdentityMap;

/// Build the session table from the full normalized event set.
pub fn build_sessions(events: &[NormalizedEvent], identity: &IdentityMap) -> Vec<SessionRow> {
    let mut by_device: BTreeMap<&str, Vec<&NormalizedEvent>> = BTreeMap::new();
    for event in events {
        by_device.entry(&event.device_id).or_default().push(event);
    }

    let mut sessions = Vec::new();

    for (device_id, mut stream) in by_device {
        stream.sort_by_key(|e| (e.event_time, e.ingest_index));

        let mut ordinal: u32 = 0;
        let mut current: Vec<&NormalizedEvent> = Vec::new();

        for event in stream {
            let gap_break = current
                .last()
                .map(|prev| event.event_time - prev.event_time >= policy::session_gap())
                .unwrap_or(false);

            if gap_break {
                sessions.push(close_session(device_id, ordinal, &current, identity));
                ordinal += 1;
                current.clear();
            }
            current.push(event);
        }

        if !current.is_empty() {
            sessions.push(close_session(device_id, ordinal, &current, identity));
        }
    }

    sessions
}

/// Aggregate one maximal run of events into a session row.
fn close_session(
    device_id: &str,
    ordinal: u32,
    events: &[&NormalizedEvent],
    identity: &IdentityMap,
) -> SessionRow {
    let first = events[0];
    let last = events[events.len() - 1];

    let mut page_views = 0u32;
    let mut cart_adds = 0u32;
    let mut did_checkout = false;
    let mut captured_email = false;
    let mut converted = false;

    for event in events {
        match event.event_type {
            EventType::PageViewed => page_views += 1,
            EventType::ProductAddedToCart => cart_adds += 1,
            EventType::CheckoutStarted => did_checkout = true,
            EventType::EmailFilledOnPopup => captured_email = true,
            EventType::CheckoutCompleted => converted = true,
        }
    }

    let duration = last.event_time - first.event_time;

    SessionRow {
        session_id: ids::session_id(device_id, ordinal),
        person_id: identity.resolve(device_id).to_string(),
        device_id: device_id.to_string(),
        started_at: first.event_time,
        ended_at: last.event_time,
        duration_minutes: duration.num_milliseconds() as f64 / 60_000.0,

        channel: first.traffic.channel,
        source: first.traffic.source.clone(),
        medium: first.traffic.medium.clone(),
        campaign: first.traffic.campaign.clone(),

        platform: first.device.platform.clone(),
        os: first.device.os.clone(),
        browser: first.device.browser.clone(),

        actions: events.len() as u32,
        page_views,
        cart_adds,
        did_checkout,
        captured_email,
        converted,
    }
}
