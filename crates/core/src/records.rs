//! Output-table row types.
//!
//! Four durable tables, replaced atomically as a unit each run:
//! identity_map, sessions, attribution, order_lines. Row fields are the
//! external contract read by the reporting and monitoring collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traffic::Channel;

/// One identity_map row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRow {
    pub device_id: String,
    pub person_id: String,
}

/// One sessions row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub session_id: Uuid,
    pub person_id: String,
    pub device_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: f64,

    // First-touch traffic attributes
    pub channel: Channel,
    pub source: String,
    pub medium: String,
    pub campaign: String,

    // First-touch device attributes
    pub platform: String,
    pub os: String,
    pub browser: String,

    // Aggregates
    pub actions: u32,
    pub page_views: u32,
    pub cart_adds: u32,
    pub did_checkout: bool,
    pub captured_email: bool,
    pub converted: bool,
}

/// One attribution row; absent entirely for unattributable purchases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRow {
    pub transaction_ref: Uuid,
    pub person_id: String,
    pub revenue: f64,
    pub purchase_time: DateTime<Utc>,

    // Last-click credit
    pub lc_session_id: Uuid,
    pub lc_channel: Channel,
    pub lc_source: String,
    pub lc_medium: String,

    // First-click credit
    pub fc_session_id: Uuid,
    pub fc_channel: Channel,
    pub fc_source: String,
    pub fc_medium: String,
}

/// One order_lines row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRow {
    pub transaction_ref: Uuid,
    pub purchase_time: DateTime<Utc>,
    pub device_id: String,
    pub declared_order_revenue: f64,
    pub item_id: String,
    pub item_name: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub line_total: f64,
}

/// The four derived tables of one engine run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineTables {
    pub identity_map: Vec<IdentityRow>,
    pub sessions: Vec<SessionRow>,
    pub attribution: Vec<AttributionRow>,
    pub order_lines: Vec<OrderLineRow>,
}
