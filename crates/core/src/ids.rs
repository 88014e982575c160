//! Deterministic key derivation.
//!
//! Every derived key is a UUIDv5 of immutable input fields under a fixed
//! engine namespace, so re-running the engine on unchanged input
//! reproduces identical keys. Upstream transaction identifiers are
//! observed to collide across distinct purchases and are never used as
//! keys.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fixed namespace for all engine-derived keys.
pub const ENGINE_NAMESPACE: Uuid = Uuid::from_u128(0x8c4f_19a2_77be_4d02_9e31_55c0_a6d8_f4b7);

/// Derive the stable session id for a device's nth session (0-based).
pub fn session_id(device_id: &str, ordinal: u32) -> Uuid {
    let name = format!("session:{}:{}", device_id, ordinal);
    Uuid::new_v5(&ENGINE_NAMESPACE, name.as_bytes())
}

/// Derive the surrogate key for a completed purchase.
///
/// Keyed on `(device_id, event_time)` rather than the upstream
/// transaction identifier.
pub fn purchase_key(device_id: &str, purchase_time: DateTime<Utc>) -> Uuid {
    let name = format!(
        "purchase:{}:{}",
        device_id,
        purchase_time.timestamp_millis()
    );
    Uuid::new_v5(&ENGINE_NAMESPACE, name.as_bytes())
}
