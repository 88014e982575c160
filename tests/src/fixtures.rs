//! Test fixtures and event generators.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use engine_core::AcceptedEvent;
use serde_json::{json, Value};

pub const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Generate a raw accepted-event row with upstream field names.
pub fn raw_event(device: &str, timestamp: &str, event_name: &str, event_data: Value) -> Value {
    json!({
        "client_id": device,
        "timestamp": timestamp,
        "event_name": event_name,
        "event_data": event_data,
        "page_url": "https://shop.example.com/",
        "referrer": null,
        "user_agent": CHROME_MAC,
    })
}

/// Generate a pageview row.
pub fn pageview(device: &str, timestamp: &str) -> Value {
    raw_event(device, timestamp, "page_viewed", Value::Null)
}

/// Generate a pageview row with explicit page URL and referrer.
pub fn pageview_from(device: &str, timestamp: &str, page_url: &str, referrer: &str) -> Value {
    let mut event = pageview(device, timestamp);
    event["page_url"] = json!(page_url);
    event["referrer"] = json!(referrer);
    event
}

/// Generate an email-capture row.
pub fn email_capture(device: &str, timestamp: &str, email: &str) -> Value {
    raw_event(
        device,
        timestamp,
        "email_filled_on_popup",
        json!({ "email": email }),
    )
}

/// Generate an add-to-cart row.
pub fn cart_add(device: &str, timestamp: &str) -> Value {
    raw_event(
        device,
        timestamp,
        "product_added_to_cart",
        json!({ "item_id": "SKU-1" }),
    )
}

/// Generate a checkout-started row.
pub fn checkout_started(device: &str, timestamp: &str) -> Value {
    raw_event(device, timestamp, "checkout_started", Value::Null)
}

/// Generate a completed-purchase row.
pub fn purchase(device: &str, timestamp: &str, revenue: f64, transaction_id: &str) -> Value {
    raw_event(
        device,
        timestamp,
        "checkout_completed",
        json!({
            "revenue": revenue,
            "transaction_id": transaction_id,
            "items": [
                { "item_id": "SKU-1", "item_name": "Mattress", "unit_price": revenue, "quantity": 1 }
            ]
        }),
    )
}

/// Render rows as an NDJSON document.
pub fn ndjson(rows: &[Value]) -> String {
    let mut body = String::new();
    for row in rows {
        body.push_str(&row.to_string());
        body.push('\n');
    }
    body
}

/// Write rows as an NDJSON input file under `dir`.
pub fn write_input(dir: &Path, rows: &[Value]) -> PathBuf {
    let path = dir.join("accepted_events.ndjson");
    let mut file = File::create(&path).expect("create input file");
    file.write_all(ndjson(rows).as_bytes())
        .expect("write input file");
    path
}

/// Parse rows into accepted events, preserving order.
pub fn accepted(rows: &[Value]) -> Vec<AcceptedEvent> {
    rows.iter()
        .map(|row| serde_json::from_value(row.clone()).expect("valid accepted event"))
        .collect()
}
