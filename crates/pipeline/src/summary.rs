//! Run summary.
//!
//! The counters the monitoring collaborator needs, computed from the
//! produced tables rather than by re-scanning raw input. Attributed
//! revenue may legitimately fall short of raw purchase revenue: the
//! difference is reported here, never silently corrected.

use engine_core::EngineTables;
use serde::Serialize;

use crate::order_lines::ExpansionStats;
use crate::purchases::Purchase;

/// Counters describing one completed engine run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub events: usize,
    pub devices: usize,
    pub stitched_devices: usize,
    pub sessions: usize,

    pub purchases: usize,
    pub attributed_purchases: usize,
    pub unattributed_purchases: usize,
    pub purchases_missing_revenue: usize,

    pub raw_purchase_revenue: f64,
    pub attributed_revenue: f64,

    pub order_lines: usize,
    pub duplicate_purchases_skipped: usize,
    pub revenue_mismatched_orders: usize,
}

/// Compute the run summary for one batch.
pub fn summarize(
    events: usize,
    tables: &EngineTables,
    purchases: &[Purchase],
    expansion: ExpansionStats,
) -> RunSummary {
    let stitched_devices = tables
        .identity_map
        .iter()
        .filter(|row| row.person_id != row.device_id)
        .count();

    let raw_purchase_revenue: f64 = purchases.iter().filter_map(|p| p.revenue).sum();
    let attributed_revenue: f64 = tables.attribution.iter().map(|row| row.revenue).sum();

    RunSummary {
        events,
        devices: tables.identity_map.len(),
        stitched_devices,
        sessions: tables.sessions.len(),

        purchases: purchases.len(),
        attributed_purchases: tables.attribution.len(),
        unattributed_purchases: purchases.len() - tables.attribution.len(),
        purchases_missing_revenue: purchases.iter().filter(|p| p.revenue.is_none()).count(),

        raw_purchase_revenue,
        attributed_revenue,

        order_lines: tables.order_lines.len(),
        duplicate_purchases_skipped: expansion.duplicates_skipped,
        revenue_mismatched_orders: expansion.revenue_mismatches,
    }
}
