//! Order line expansion.
//!
//! Expands embedded line-item payloads into flat rows for revenue
//! reconciliation. Raw purchases sharing an upstream transaction
//! identifier on the same device are deduplicated to the chronologically
//! first; later duplicates are dropped from expansion entirely (they
//! remain visible to attribution under their surrogate keys, so revenue
//! is not lost). Declared order revenue is the purchase's top-level
//! field, never the item sum; rows where the two diverge are flagged,
//! not corrected.

use std::collections::BTreeMap;

use engine_core::{policy, OrderLineRow};
use tracing::warn;
use uuid::Uuid;

use crate::purchases::Purchase;

/// Expansion outcome counters for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    /// Duplicate purchases dropped by the `(transaction_id, device_id)` rule.
    pub duplicates_skipped: usize,
    /// Purchases whose summed line totals diverge from declared revenue.
    pub revenue_mismatches: usize,
}

/// Expand line items for all deduplicated purchases.
///
/// `purchases` must already be in `(purchase_time, ingest_index)` order,
/// as produced by [`crate::purchases::collect_purchases`].
pub fn expand_order_lines(purchases: &[Purchase]) -> (Vec<OrderLineRow>, ExpansionStats) {
    // Earliest purchase wins per (transaction_id, device_id); purchases
    // without an upstream identifier are never deduplicated.
    let mut winners: BTreeMap<(&str, &str), Uuid> = BTreeMap::new();
    let mut stats = ExpansionStats::default();

    for purchase in purchases {
        if let Some(ref txn) = purchase.transaction_id {
            winners
                .entry((txn.as_str(), purchase.device_id.as_str()))
                .or_insert(purchase.key);
        }
    }

    let mut rows = Vec::new();

    for purchase in purchases {
        if let Some(ref txn) = purchase.transaction_id {
            let winner = winners[&(txn.as_str(), purchase.device_id.as_str())];
            if winner != purchase.key {
                stats.duplicates_skipped += 1;
                continue;
            }
        }

        if purchase.line_items.is_empty() {
            continue;
        }

        let declared = purchase.revenue.unwrap_or(0.0);
        let mut item_sum = 0.0;

        for item in &purchase.line_items {
            let line_total = item.unit_price * item.quantity as f64;
            item_sum += line_total;

            rows.push(OrderLineRow {
                transaction_ref: purchase.key,
                purchase_time: purchase.purchase_time,
                device_id: purchase.device_id.clone(),
                declared_order_revenue: declared,
                item_id: item.item_id.clone(),
                item_name: item.item_name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
                line_total,
            });
        }

        if (item_sum - declared).abs() > policy::REVENUE_TOLERANCE {
            stats.revenue_mismatches += 1;
            warn!(
                transaction_ref = %purchase.key,
                declared,
                item_sum,
                "line totals diverge from declared order revenue"
            );
        }
    }

    (rows, stats)
}
