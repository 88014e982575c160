//! Attribution behavior through the full stage chain.

use integration_tests::fixtures;
use pipeline::{attribute, build_sessions, collect_purchases, IdentityMap, Normalizer};

fn attribution_for(rows: &[serde_json::Value]) -> Vec<engine_core::AttributionRow> {
    let accepted = fixtures::accepted(rows);
    let normalized = Normalizer::new().normalize_all(&accepted).unwrap();
    let identity = IdentityMap::build(&normalized);
    let sessions = build_sessions(&normalized, &identity);
    let purchases = collect_purchases(&normalized, &identity);
    attribute(&purchases, &sessions)
}

#[test]
fn test_lookback_boundary_exactly_seven_days() {
    // A session starting exactly seven days before the purchase still
    // takes first-click credit.
    let rows = vec![
        fixtures::pageview_from(
            "dev-1",
            "2024-03-01T12:00:00Z",
            "https://shop.example.com/",
            "https://www.google.com/",
        ),
        fixtures::purchase("dev-1", "2024-03-08T12:00:00Z", 300.0, "TXN-1"),
    ];
    let attribution = attribution_for(&rows);

    assert_eq!(attribution.len(), 1);
    assert_ne!(attribution[0].fc_session_id, attribution[0].lc_session_id);
    assert_eq!(attribution[0].fc_channel, engine_core::Channel::OrganicSearch);
}

#[test]
fn test_lookback_boundary_seven_days_one_second_stale() {
    // One second past the window the old session loses credit; the
    // purchase's own session takes both sides instead.
    let rows = vec![
        fixtures::pageview_from(
            "dev-1",
            "2024-03-01T11:59:59Z",
            "https://shop.example.com/",
            "https://www.google.com/",
        ),
        fixtures::purchase("dev-1", "2024-03-08T12:00:00Z", 300.0, "TXN-1"),
    ];
    let attribution = attribution_for(&rows);

    assert_eq!(attribution.len(), 1);
    assert_eq!(attribution[0].fc_session_id, attribution[0].lc_session_id);
    assert_eq!(attribution[0].fc_channel, engine_core::Channel::Direct);
}

#[test]
fn test_cross_device_credit_through_stitched_identity() {
    // Research on the laptop, identified by email; purchase on the
    // phone under the same email. First-click lands on the laptop
    // session even though the purchase device never saw it.
    let rows = vec![
        fixtures::pageview_from(
            "laptop",
            "2024-03-04T09:00:00Z",
            "https://shop.example.com/?utm_source=ads&utm_medium=cpc",
            "",
        ),
        fixtures::email_capture("laptop", "2024-03-04T09:05:00Z", "jane@example.com"),
        fixtures::email_capture("phone", "2024-03-06T20:00:00Z", "jane@example.com"),
        fixtures::purchase("phone", "2024-03-06T20:10:00Z", 750.0, "TXN-7"),
    ];
    let attribution = attribution_for(&rows);

    assert_eq!(attribution.len(), 1);
    let row = &attribution[0];
    assert_eq!(row.person_id, "jane@example.com");
    assert_eq!(row.fc_channel, engine_core::Channel::Paid);
    assert_eq!(row.fc_source, "ads");
    assert_ne!(row.fc_session_id, row.lc_session_id);
}

#[test]
fn test_purchase_with_only_stale_session_is_dropped() {
    // Continuous activity with sub-30-minute gaps keeps one session
    // alive from eight days before the purchase; its started_at falls
    // outside the lookback, so the purchase yields no attribution row.
    let mut rows = Vec::new();
    let start = chrono::DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let purchase_time = start + chrono::Duration::days(8);

    let mut cursor = start;
    while cursor < purchase_time {
        rows.push(fixtures::pageview(
            "dev-1",
            &cursor.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ));
        cursor += chrono::Duration::minutes(29);
    }
    rows.push(fixtures::purchase(
        "dev-1",
        &purchase_time
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        500.0,
        "TXN-1",
    ));

    let accepted = fixtures::accepted(&rows);
    let normalized = Normalizer::new().normalize_all(&accepted).unwrap();
    let identity = IdentityMap::build(&normalized);
    let sessions = build_sessions(&normalized, &identity);
    assert_eq!(sessions.len(), 1, "continuous activity must not split");

    let purchases = collect_purchases(&normalized, &identity);
    let attribution = attribute(&purchases, &sessions);
    assert!(attribution.is_empty(), "stale session must not earn credit");
}

#[test]
fn test_full_credit_under_each_model() {
    let rows = vec![
        fixtures::pageview("dev-1", "2024-03-05T10:00:00Z"),
        fixtures::pageview("dev-1", "2024-03-06T10:00:00Z"),
        fixtures::purchase("dev-1", "2024-03-07T10:00:00Z", 420.0, "TXN-1"),
    ];
    let attribution = attribution_for(&rows);

    // Exactly one row per purchase; each model carries the full amount.
    assert_eq!(attribution.len(), 1);
    assert_eq!(attribution[0].revenue, 420.0);
}

#[test]
fn test_latest_email_correction_rebinds_history() {
    // A corrected email later in the stream wins for the whole device
    // history, so the purchase attributes under the corrected person.
    let rows = vec![
        fixtures::email_capture("dev-1", "2024-03-01T10:00:00Z", "typo@exmaple.com"),
        fixtures::purchase("dev-1", "2024-03-01T10:05:00Z", 100.0, "TXN-1"),
        fixtures::email_capture("dev-1", "2024-03-01T10:06:00Z", "fixed@example.com"),
    ];
    let attribution = attribution_for(&rows);

    assert_eq!(attribution.len(), 1);
    assert_eq!(attribution[0].person_id, "fixed@example.com");
}
