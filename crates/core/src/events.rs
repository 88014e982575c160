//! Event types and payload extraction.
//!
//! This module handles:
//! - The accepted-event contract as produced by the upstream validator
//! - The closed event-type enumeration
//! - Lenient extraction of purchase details and self-identifiers from
//!   the structured payload
//! - The normalized event consumed by every pipeline stage

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::traffic::TrafficSource;

/// Closed set of event types accepted from the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageViewed,
    EmailFilledOnPopup,
    ProductAddedToCart,
    CheckoutStarted,
    /// Legacy upstream exports labeled completed checkouts `purchase`.
    #[serde(alias = "purchase")]
    CheckoutCompleted,
}

impl EventType {
    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageViewed => "page_viewed",
            Self::EmailFilledOnPopup => "email_filled_on_popup",
            Self::ProductAddedToCart => "product_added_to_cart",
            Self::CheckoutStarted => "checkout_started",
            Self::CheckoutCompleted => "checkout_completed",
        }
    }

    /// Whether this event represents a completed purchase.
    pub fn is_purchase(&self) -> bool {
        matches!(self, Self::CheckoutCompleted)
    }

    /// Whether this event may carry a self-identifying email.
    pub fn carries_identity(&self) -> bool {
        matches!(self, Self::EmailFilledOnPopup | Self::CheckoutCompleted)
    }
}

/// One accepted raw event, as emitted by the upstream validator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AcceptedEvent {
    /// Client-side device identifier (upstream exports call it client_id).
    #[serde(alias = "client_id")]
    #[validate(length(min = 1, max = 128))]
    pub device_id: String,

    /// Event instant (UTC).
    #[serde(deserialize_with = "de_event_time")]
    pub timestamp: DateTime<Utc>,

    /// Event type.
    pub event_name: EventType,

    /// Structured payload: an object, a JSON-encoded string of one, or null.
    #[serde(default)]
    pub event_data: Value,

    /// Full page URL including marketing parameters.
    #[validate(length(min = 1, max = 2048))]
    pub page_url: String,

    /// Referring page URL, absent for direct visits.
    #[serde(default)]
    pub referrer: Option<String>,

    /// Browser user agent.
    #[validate(length(max = 512))]
    pub user_agent: String,
}

/// Deserialize an event timestamp.
///
/// Upstream exports mix RFC 3339 and space-separated forms; both were
/// accepted by the validator, so both must parse here.
fn de_event_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_event_time(&raw).ok_or_else(|| serde::de::Error::custom("unparseable timestamp"))
}

/// Parse an event timestamp from its accepted wire forms.
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

/// One line item embedded in a purchase payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: String,
    pub item_name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

/// Purchase details extracted from a completed-checkout payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurchaseDetails {
    pub revenue: Option<f64>,
    pub transaction_id: Option<String>,
    pub items: Vec<LineItem>,
}

/// Resolve the structured payload to a JSON object.
///
/// Null, empty, and the literal string "null" resolve to an empty
/// object; anything else that fails to decode is a contract violation
/// surfaced as an error message for the reader to attach a line number.
pub fn payload_object(event_data: &Value) -> Result<Value, String> {
    match event_data {
        Value::Null => Ok(Value::Object(Default::default())),
        Value::Object(_) => Ok(event_data.clone()),
        Value::String(raw) => {
            let raw = raw.trim();
            if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
                return Ok(Value::Object(Default::default()));
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(Value::Object(map)),
                Ok(_) => Err("event_data JSON must be an object".into()),
                Err(e) => Err(format!("event_data is not valid JSON: {}", e)),
            }
        }
        _ => Err("event_data must be a JSON object or string".into()),
    }
}

/// Extract a self-identifying email from a payload object.
pub fn email_from_payload(payload: &Value) -> Option<String> {
    let email = payload.get("email")?.as_str()?.trim().to_ascii_lowercase();
    if email.is_empty() {
        None
    } else {
        Some(email)
    }
}

/// Extract purchase details from a payload object.
///
/// Line items are front-end constructed and error-prone: a missing or
/// malformed items array yields zero items, never an error, and revenue
/// stays on the top-level field.
pub fn purchase_from_payload(payload: &Value) -> PurchaseDetails {
    let revenue = payload
        .get("revenue")
        .or_else(|| payload.get("value"))
        .and_then(as_number);

    let transaction_id = payload
        .get("transaction_id")
        .or_else(|| payload.get("order_id"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    let items = payload
        .get("items")
        .or_else(|| payload.get("line_items"))
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(line_item).collect())
        .unwrap_or_default();

    PurchaseDetails {
        revenue,
        transaction_id,
        items,
    }
}

fn line_item(entry: &Value) -> Option<LineItem> {
    let obj = entry.as_object()?;

    let item_id = obj
        .get("item_id")
        .or_else(|| obj.get("id"))
        .or_else(|| obj.get("sku"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let item_name = obj
        .get("item_name")
        .or_else(|| obj.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let unit_price = obj
        .get("unit_price")
        .or_else(|| obj.get("price"))
        .and_then(as_number)
        .unwrap_or(0.0);

    let quantity = obj
        .get("quantity")
        .or_else(|| obj.get("qty"))
        .and_then(as_number)
        .map(|q| q.max(0.0) as u32)
        .unwrap_or(1);

    Some(LineItem {
        item_id,
        item_name,
        unit_price,
        quantity,
    })
}

/// Read a numeric payload field; front-end payloads stringify numbers.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Device attributes classified from the user agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAttributes {
    pub platform: String,
    pub os: String,
    pub browser: String,
}

impl Default for DeviceAttributes {
    fn default() -> Self {
        Self {
            platform: "unknown".into(),
            os: "unknown".into(),
            browser: "unknown".into(),
        }
    }
}

/// One normalized event, the unit every pipeline stage consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub device_id: String,
    pub event_time: DateTime<Utc>,
    pub event_type: EventType,
    /// Original ingestion ordinal; stable tie-break for equal timestamps.
    pub ingest_index: usize,
    pub traffic: TrafficSource,
    pub device: DeviceAttributes,
    pub self_identifier: Option<String>,
    pub revenue: Option<f64>,
    pub transaction_id: Option<String>,
    pub line_items: Vec<LineItem>,
}
