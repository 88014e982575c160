//! Fixed policy constants for sessionization, attribution, and
//! reconciliation.
//!
//! These are business rules, not tunables: downstream tables are defined
//! in terms of them, so they are compiled in rather than configured.

use chrono::Duration;

/// Inactivity gap that closes a session, in minutes.
///
/// The boundary is inclusive: a gap of exactly 30:00 starts a new
/// session, 29:59 does not.
pub const SESSION_GAP_MINUTES: i64 = 30;

/// Attribution lookback window, in days.
///
/// Sessions starting inside `[purchase_time - 7d, purchase_time]`
/// (both bounds inclusive) qualify for credit.
pub const LOOKBACK_DAYS: i64 = 7;

/// Tolerance when reconciling summed line totals against the declared
/// order revenue. Divergence beyond this is flagged, never corrected.
pub const REVENUE_TOLERANCE: f64 = 0.01;

/// The session gap as a chrono duration.
pub fn session_gap() -> Duration {
    Duration::minutes(SESSION_GAP_MINUTES)
}

/// The attribution lookback as a chrono duration.
pub fn lookback_window() -> Duration {
    Duration::days(LOOKBACK_DAYS)
}
