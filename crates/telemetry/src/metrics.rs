//! Internal metrics collection.
//!
//! Counters and stage-latency histograms collected in-memory during a
//! run; a snapshot is logged when the run completes. These are the
//! engine-side counters the monitoring collaborator reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// Histogram for stage latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the attribution engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Input metrics
    pub events_read: Counter,
    pub events_normalized: Counter,

    // Identity metrics
    pub devices_observed: Counter,
    pub devices_stitched: Counter,

    // Session metrics
    pub sessions_built: Counter,

    // Attribution metrics
    pub purchases_observed: Counter,
    pub purchases_attributed: Counter,
    pub purchases_unattributed: Counter,

    // Order line metrics
    pub order_lines_expanded: Counter,
    pub duplicate_purchases_skipped: Counter,
    pub revenue_mismatches: Counter,

    // Stage latency histograms
    pub normalize_latency_ms: Histogram,
    pub sessionize_latency_ms: Histogram,
    pub attribution_latency_ms: Histogram,
    pub expansion_latency_ms: Histogram,
    pub write_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_read: u64,
    pub events_normalized: u64,
    pub devices_observed: u64,
    pub devices_stitched: u64,
    pub sessions_built: u64,
    pub purchases_observed: u64,
    pub purchases_attributed: u64,
    pub purchases_unattributed: u64,
    pub order_lines_expanded: u64,
    pub duplicate_purchases_skipped: u64,
    pub revenue_mismatches: u64,
    pub normalize_latency_mean_ms: f64,
    pub sessionize_latency_mean_ms: f64,
    pub attribution_latency_mean_ms: f64,
    pub expansion_latency_mean_ms: f64,
    pub write_latency_mean_ms: f64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_read: self.events_read.get(),
            events_normalized: self.events_normalized.get(),
            devices_observed: self.devices_observed.get(),
            devices_stitched: self.devices_stitched.get(),
            sessions_built: self.sessions_built.get(),
            purchases_observed: self.purchases_observed.get(),
            purchases_attributed: self.purchases_attributed.get(),
            purchases_unattributed: self.purchases_unattributed.get(),
            order_lines_expanded: self.order_lines_expanded.get(),
            duplicate_purchases_skipped: self.duplicate_purchases_skipped.get(),
            revenue_mismatches: self.revenue_mismatches.get(),
            normalize_latency_mean_ms: self.normalize_latency_ms.mean(),
            sessionize_latency_mean_ms: self.sessionize_latency_ms.mean(),
            attribution_latency_mean_ms: self.attribution_latency_ms.mean(),
            expansion_latency_mean_ms: self.expansion_latency_ms.mean(),
            write_latency_mean_ms: self.write_latency_ms.mean(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
