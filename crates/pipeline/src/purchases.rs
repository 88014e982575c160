//! Purchase extraction.
//!
//! Completed-checkout events become Purchases keyed by a surrogate of
//! `(device_id, event_time)`. The upstream transaction identifier is
//! observed to collide across distinct purchases, so it is carried for
//! reference and line-item dedup only, never as a join key.

use chrono::{DateTime, Utc};
use engine_core::{ids, LineItem, NormalizedEvent};
use uuid::Uuid;

use crate::identity::IdentityMap;

/// One completed purchase.
#[derive(Debug, Clone)]
pub struct Purchase {
    /// Surrogate key derived from `(device_id, purchase_time)`.
    pub key: Uuid,
    pub device_id: String,
    pub person_id: String,
    pub purchase_time: DateTime<Utc>,
    pub revenue: Option<f64>,
    /// Upstream transaction identifier, reference only.
    pub transaction_id: Option<String>,
    pub line_items: Vec<LineItem>,
    pub ingest_index: usize,
}

/// Collect all purchases from the normalized event set, in
/// `(purchase_time, ingest_index)` order.
pub fn collect_purchases(events: &[NormalizedEvent], identity: &IdentityMap) -> Vec<Purchase> {
    let mut purchases: Vec<Purchase> = events
        .iter()
        .filter(|e| e.event_type.is_purchase())
        .map(|e| Purchase {
            key: ids::purchase_key(&e.device_id, e.event_time),
            device_id: e.device_id.clone(),
            person_id: identity.resolve(&e.device_id).to_string(),
            purchase_time: e.event_time,
            revenue: e.revenue,
            transaction_id: e.transaction_id.clone(),
            line_items: e.line_items.clone(),
            ingest_index: e.ingest_index,
        })
        .collect();

    purchases.sort_by(|a, b| {
        (a.purchase_time, a.ingest_index).cmp(&(b.purchase_time, b.ingest_index))
    });
    purchases
}
