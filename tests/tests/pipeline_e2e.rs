//! End-to-end pipeline tests.
//!
//! Drives a full engine run from an NDJSON input file to the four
//! output tables, the way the external orchestrator invokes it.

use std::fs;

use integration_tests::fixtures;
use pipeline::EngineConfig;

const TABLE_FILES: [&str; 4] = [
    "identity_map.ndjson",
    "sessions.ndjson",
    "attribution.ndjson",
    "order_lines.ndjson",
];

fn engine_config(dir: &std::path::Path, rows: &[serde_json::Value]) -> EngineConfig {
    EngineConfig {
        input: fixtures::write_input(dir, rows),
        output_dir: dir.to_path_buf(),
    }
}

fn journey_rows() -> Vec<serde_json::Value> {
    vec![
        fixtures::pageview_from(
            "dev-1",
            "2024-03-01T10:00:00Z",
            "https://shop.example.com/?utm_source=ads&utm_medium=cpc&utm_campaign=spring",
            "",
        ),
        fixtures::cart_add("dev-1", "2024-03-01T10:05:00Z"),
        fixtures::email_capture("dev-1", "2024-03-01T10:06:00Z", "jane@example.com"),
        fixtures::checkout_started("dev-1", "2024-03-01T10:10:00Z"),
        fixtures::purchase("dev-1", "2024-03-01T10:12:00Z", 999.0, "TXN-1"),
        fixtures::pageview("dev-2", "2024-03-01T11:00:00Z"),
    ]
}

#[tokio::test]
async fn test_full_run_produces_four_tables() {
    let dir = tempfile::tempdir().unwrap();
    let config = engine_config(dir.path(), &journey_rows());

    let outcome = pipeline::run(&config).await.unwrap();

    let tables_dir = dir.path().join("tables");
    for name in TABLE_FILES {
        assert!(tables_dir.join(name).exists(), "missing {}", name);
    }

    assert_eq!(outcome.summary.events, 6);
    assert_eq!(outcome.summary.devices, 2);
    assert_eq!(outcome.summary.stitched_devices, 1);
    assert_eq!(outcome.summary.sessions, 2);
    assert_eq!(outcome.summary.purchases, 1);
    assert_eq!(outcome.summary.attributed_purchases, 1);
    assert_eq!(outcome.summary.raw_purchase_revenue, 999.0);
    assert_eq!(outcome.summary.attributed_revenue, 999.0);
    assert_eq!(outcome.summary.order_lines, 1);

    // The purchasing device resolves to the captured email, retroactively.
    let identity = fs::read_to_string(tables_dir.join("identity_map.ndjson")).unwrap();
    assert!(identity.contains("jane@example.com"));

    // Paid first-touch sticks to the purchase session.
    let sessions = fs::read_to_string(tables_dir.join("sessions.ndjson")).unwrap();
    assert!(sessions.contains("\"channel\":\"paid\""));
    assert!(sessions.contains("\"campaign\":\"spring\""));
}

#[tokio::test]
async fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let config = engine_config(dir.path(), &journey_rows());

    pipeline::run(&config).await.unwrap();
    let first: Vec<Vec<u8>> = TABLE_FILES
        .iter()
        .map(|name| fs::read(dir.path().join("tables").join(name)).unwrap())
        .collect();

    pipeline::run(&config).await.unwrap();
    let second: Vec<Vec<u8>> = TABLE_FILES
        .iter()
        .map(|name| fs::read(dir.path().join("tables").join(name)).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_contract_violation_fails_run_and_preserves_tables() {
    let dir = tempfile::tempdir().unwrap();

    // First run succeeds and lays down tables.
    let good = engine_config(dir.path(), &journey_rows());
    pipeline::run(&good).await.unwrap();
    let before = fs::read(dir.path().join("tables/sessions.ndjson")).unwrap();

    // Second run trips over a malformed row and must change nothing.
    let mut rows = journey_rows();
    rows.push(serde_json::json!({
        "client_id": "dev-3",
        "timestamp": "not-a-time",
        "event_name": "page_viewed",
        "event_data": null,
        "page_url": "https://shop.example.com/",
        "referrer": null,
        "user_agent": "Mozilla/5.0",
    }));
    rows.push(fixtures::pageview("dev-4", "2024-03-02T09:00:00Z"));

    let bad = engine_config(dir.path(), &rows);
    let err = pipeline::run(&bad).await.unwrap_err();
    assert!(err.to_string().contains("line 7"));

    let after = fs::read(dir.path().join("tables/sessions.ndjson")).unwrap();
    assert_eq!(before, after);
    assert!(!String::from_utf8(after).unwrap().contains("dev-4"));
}

#[tokio::test]
async fn test_duplicate_purchases_dedupe_lines_but_not_revenue() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![
        fixtures::pageview("dev-1", "2024-03-01T10:00:00Z"),
        fixtures::purchase("dev-1", "2024-03-01T10:05:00Z", 500.0, "TXN-9"),
        // Same upstream transaction id replayed two minutes later.
        fixtures::purchase("dev-1", "2024-03-01T10:07:00Z", 500.0, "TXN-9"),
    ];
    let config = engine_config(dir.path(), &rows);

    let outcome = pipeline::run(&config).await.unwrap();

    // Both purchases stay visible to attribution under surrogate keys...
    assert_eq!(outcome.summary.purchases, 2);
    assert_eq!(outcome.summary.attributed_purchases, 2);
    assert_eq!(outcome.summary.raw_purchase_revenue, 1000.0);
    assert_eq!(outcome.summary.attributed_revenue, 1000.0);

    // ...but only the earliest expands into order lines.
    assert_eq!(outcome.summary.order_lines, 1);
    assert_eq!(outcome.summary.duplicate_purchases_skipped, 1);
}

#[tokio::test]
async fn test_divergent_line_totals_are_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let mut row = fixtures::purchase("dev-1", "2024-03-01T10:00:00Z", 999.0, "TXN-1");
    row["event_data"]["items"][0]["unit_price"] = serde_json::json!(100.0);

    let config = engine_config(dir.path(), &[row]);
    let outcome = pipeline::run(&config).await.unwrap();

    assert_eq!(outcome.summary.revenue_mismatched_orders, 1);
    // Declared revenue is carried unchanged into the order line.
    let lines = fs::read_to_string(dir.path().join("tables/order_lines.ndjson")).unwrap();
    assert!(lines.contains("\"declared_order_revenue\":999.0"));
    assert!(lines.contains("\"line_total\":100.0"));
}
