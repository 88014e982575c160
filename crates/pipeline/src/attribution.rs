//! Revenue attribution.
//!
//! For each purchase, qualifying sessions are those of the same person
//! with `started_at` inside the inclusive 7-day lookback window ending
//! at the purchase instant. One ranking pass orders them by
//! `(started_at, session_id)`; first-click credit goes to the head,
//! last-click to the tail, each at 100%. A purchase with no qualifying
//! session produces no row: lost revenue is surfaced by the run summary,
//! never defaulted to direct.

use std::collections::BTreeMap;

use engine_core::{policy, AttributionRow, SessionRow};

use crate::purchases::Purchase;

/// Compute one attribution row per attributable purchase.
pub fn attribute(purchases: &[Purchase], sessions: &[SessionRow]) -> Vec<AttributionRow> {
    // Sessions per person, pre-ranked once; per purchase only the window
    // filter remains.
    let mut by_person: BTreeMap<&str, Vec<&SessionRow>> = BTreeMap::new();
    for session in sessions {
        by_person.entry(&session.person_id).or_default().push(session);
    }
    for ranked in by_person.values_mut() {
        ranked.sort_by_key(|s| (s.started_at, s.session_id));
    }

    let mut rows = Vec::new();

    for purchase in purchases {
        let Some(ranked) = by_person.get(purchase.person_id.as_str()) else {
            continue;
        };

        let window_start = purchase.purchase_time - policy::lookback_window();
        let qualifying: Vec<&&SessionRow> = ranked
            .iter()
            .filter(|s| s.started_at >= window_start && s.started_at <= purchase.purchase_time)
            .collect();

        let (Some(first_click), Some(last_click)) = (qualifying.first(), qualifying.last())
        else {
            continue;
        };

        rows.push(AttributionRow {
            transaction_ref: purchase.key,
            person_id: purchase.person_id.clone(),
            revenue: purchase.revenue.unwrap_or(0.0),
            purchase_time: purchase.purchase_time,

            lc_session_id: last_click.session_id,
            lc_channel: last_click.channel,
            lc_source: last_click.source.clone(),
            lc_medium: last_click.medium.clone(),

            fc_session_id: first_click.session_id,
            fc_channel: first_click.channel,
            fc_source: first_click.source.clone(),
            fc_medium: first_click.medium.clone(),
        });
    }

    rows
}
