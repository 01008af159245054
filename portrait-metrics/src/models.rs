//! Data models for metrics snapshots

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prometheus default latency buckets, in seconds
pub const DEFAULT_LATENCY_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Point-in-time copy of a latency histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSnapshot {
    /// Upper bounds of each bucket, ascending
    pub bounds: Vec<f64>,
    /// Cumulative observation count per bound (`le` semantics)
    pub cumulative_counts: Vec<u64>,
    /// Sum of all observations, in seconds
    pub sum: f64,
    /// Total number of observations (the `+Inf` bucket)
    pub count: u64,
}

impl HistogramSnapshot {
    /// Mean observation in milliseconds, 0 when empty
    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64 * 1000.0
        }
    }
}

/// Point-in-time copy of all service metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub started_at: DateTime<Utc>,
    pub captured_at: DateTime<Utc>,
    pub requests_total: u64,
    pub errors_total: u64,
    /// Completed renders keyed by emotion name
    pub renders_by_emotion: BTreeMap<String, u64>,
    pub request_duration: HistogramSnapshot,
}

impl MetricsSnapshot {
    pub fn uptime_seconds(&self) -> i64 {
        (self.captured_at - self.started_at).num_seconds()
    }

    /// Fraction of requests that failed, 0 when no request was seen
    pub fn error_rate(&self) -> f64 {
        if self.requests_total == 0 {
            0.0
        } else {
            self.errors_total as f64 / self.requests_total as f64
        }
    }

    pub fn renders_total(&self) -> u64 {
        self.renders_by_emotion.values().sum()
    }
}
