//! Full-run orchestration.
//!
//! One run is a two-phase pipeline: build the identity map from the
//! whole batch first, then join it against every downstream table.
//! Sessionization and order-line expansion have no mutual data
//! dependency and run on parallel blocking tasks; attribution waits on
//! the sessionizer. The four tables are written atomically as a unit at
//! the end — a failed run leaves the previous tables untouched.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use engine_core::{EngineTables, Error, Result};
use tables::{read_accepted_events, TableWriter};
use telemetry::metrics;
use tracing::info;

use crate::identity::IdentityMap;
use crate::normalizer::Normalizer;
use crate::summary::{self, RunSummary};
use crate::{attribution, order_lines, purchases, sessionizer};

/// Engine configuration for one batch run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Accepted-event NDJSON input.
    pub input: PathBuf,
    /// Directory receiving the `tables/` output.
    pub output_dir: PathBuf,
}

/// Result of one completed run.
#[derive(Debug)]
pub struct RunOutcome {
    pub tables: EngineTables,
    pub summary: RunSummary,
}

/// Execute one full engine run.
pub async fn run(config: &EngineConfig) -> Result<RunOutcome> {
    let accepted = read_accepted_events(&config.input)?;
    metrics().events_read.inc_by(accepted.len() as u64);

    let started = Instant::now();
    let normalized = Normalizer::new().normalize_all(&accepted)?;
    metrics().events_normalized.inc_by(normalized.len() as u64);
    metrics()
        .normalize_latency_ms
        .observe(started.elapsed().as_millis() as u64);
    info!(events = normalized.len(), "Events normalized");

    // Identity map first: the retroactive device → person resolution
    // needs the whole batch before any downstream join.
    let identity = Arc::new(IdentityMap::build(&normalized));
    metrics()
        .devices_observed
        .inc_by(identity.device_count() as u64);
    metrics()
        .devices_stitched
        .inc_by(identity.stitched_count() as u64);
    info!(
        devices = identity.device_count(),
        stitched = identity.stitched_count(),
        "Identity map built"
    );

    let normalized = Arc::new(normalized);
    let purchases = Arc::new(purchases::collect_purchases(&normalized, &identity));
    metrics().purchases_observed.inc_by(purchases.len() as u64);

    let sessions_task = {
        let normalized = Arc::clone(&normalized);
        let identity = Arc::clone(&identity);
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let sessions = sessionizer::build_sessions(&normalized, &identity);
            metrics()
                .sessionize_latency_ms
                .observe(started.elapsed().as_millis() as u64);
            sessions
        })
    };

    let lines_task = {
        let purchases = Arc::clone(&purchases);
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let expanded = order_lines::expand_order_lines(&purchases);
            metrics()
                .expansion_latency_ms
                .observe(started.elapsed().as_millis() as u64);
            expanded
        })
    };

    let sessions = sessions_task
        .await
        .map_err(|e| Error::internal(format!("sessionizer task failed: {}", e)))?;
    metrics().sessions_built.inc_by(sessions.len() as u64);
    info!(sessions = sessions.len(), "Sessions built");

    let started = Instant::now();
    let attribution = attribution::attribute(&purchases, &sessions);
    metrics()
        .attribution_latency_ms
        .observe(started.elapsed().as_millis() as u64);
    metrics()
        .purchases_attributed
        .inc_by(attribution.len() as u64);
    metrics()
        .purchases_unattributed
        .inc_by((purchases.len() - attribution.len()) as u64);
    info!(
        purchases = purchases.len(),
        attributed = attribution.len(),
        "Attribution computed"
    );

    let (order_lines, expansion) = lines_task
        .await
        .map_err(|e| Error::internal(format!("order line task failed: {}", e)))?;
    metrics()
        .order_lines_expanded
        .inc_by(order_lines.len() as u64);
    metrics()
        .duplicate_purchases_skipped
        .inc_by(expansion.duplicates_skipped as u64);
    metrics()
        .revenue_mismatches
        .inc_by(expansion.revenue_mismatches as u64);

    let tables = EngineTables {
        identity_map: identity.to_rows(),
        sessions,
        attribution,
        order_lines,
    };

    let started = Instant::now();
    TableWriter::new(&config.output_dir).write_atomic(&tables)?;
    metrics()
        .write_latency_ms
        .observe(started.elapsed().as_millis() as u64);

    let summary = summary::summarize(accepted.len(), &tables, &purchases, expansion);
    info!(
        sessions = summary.sessions,
        attributed_purchases = summary.attributed_purchases,
        unattributed_purchases = summary.unattributed_purchases,
        raw_purchase_revenue = summary.raw_purchase_revenue,
        attributed_revenue = summary.attributed_revenue,
        revenue_mismatched_orders = summary.revenue_mismatched_orders,
        "Run complete"
    );

    Ok(RunOutcome { tables, summary })
}
