//! Thread-safe metrics collection for the daemon

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::warn;

use crate::models::{HistogramSnapshot, MetricsSnapshot, DEFAULT_LATENCY_BUCKETS};

#[derive(Debug)]
struct Histogram {
    bounds: Vec<f64>,
    /// Non-cumulative count per bucket
    counts: Vec<u64>,
    sum: f64,
    count: u64,
}

impl Histogram {
    fn new(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.to_vec(),
            counts: vec![0; bounds.len()],
            sum: 0.0,
            count: 0,
        }
    }

    fn observe(&mut self, seconds: f64) {
        if let Some(i) = self.bounds.iter().position(|&b| seconds <= b) {
            self.counts[i] += 1;
        }
        self.sum += seconds;
        self.count += 1;
    }

    fn snapshot(&self) -> HistogramSnapshot {
        let cumulative_counts = self
            .counts
            .iter()
            .scan(0u64, |acc, &c| {
                *acc += c;
                Some(*acc)
            })
            .collect();

        HistogramSnapshot {
            bounds: self.bounds.clone(),
            cumulative_counts,
            sum: self.sum,
            count: self.count,
        }
    }
}

/// Collects request, error and render metrics for the daemon
#[derive(Debug)]
pub struct ServiceMetrics {
    started_at: DateTime<Utc>,
    requests_total: AtomicU64,
    errors_total: AtomicU64,
    renders_by_emotion: Mutex<BTreeMap<String, u64>>,
    request_duration: Mutex<Histogram>,

    /// Latency above which a warning is logged
    high_latency_threshold: Duration,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::with_buckets(&DEFAULT_LATENCY_BUCKETS)
    }

    /// Create a collector with custom latency bucket bounds (seconds, ascending)
    pub fn with_buckets(bounds: &[f64]) -> Self {
        Self {
            started_at: Utc::now(),
            requests_total: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            renders_by_emotion: Mutex::new(BTreeMap::new()),
            request_duration: Mutex::new(Histogram::new(bounds)),
            high_latency_threshold: Duration::from_secs(2),
        }
    }

    pub fn with_high_latency_threshold(mut self, threshold: Duration) -> Self {
        self.high_latency_threshold = threshold;
        self
    }

    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one completed render for `emotion`
    pub fn record_render(&self, emotion: &str) {
        *self
            .renders_by_emotion
            .lock()
            .entry(emotion.to_string())
            .or_insert(0) += 1;
    }

    /// Record the duration of one request
    pub fn observe_latency(&self, elapsed: Duration) {
        if elapsed > self.high_latency_threshold {
            warn!("⚠️  High latency detected: {:.1}ms", elapsed.as_secs_f64() * 1000.0);
        }
        self.request_duration.lock().observe(elapsed.as_secs_f64());
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn errors_total(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            started_at: self.started_at,
            captured_at: Utc::now(),
            requests_total: self.requests_total(),
            errors_total: self.errors_total(),
            renders_by_emotion: self.renders_by_emotion.lock().clone(),
            request_duration: self.request_duration.lock().snapshot(),
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_counters() {
        let metrics = ServiceMetrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_error();

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_total, 2);
        assert_eq!(snap.errors_total, 1);
        assert_relative_eq!(snap.error_rate(), 0.5);
    }

    #[test]
    fn test_renders_by_emotion() {
        let metrics = ServiceMetrics::new();
        metrics.record_render("happy");
        metrics.record_render("happy");
        metrics.record_render("sad");

        let snap = metrics.snapshot();
        assert_eq!(snap.renders_by_emotion.get("happy"), Some(&2));
        assert_eq!(snap.renders_by_emotion.get("sad"), Some(&1));
        assert_eq!(snap.renders_total(), 3);
    }

    #[test]
    fn test_histogram_is_cumulative() {
        let metrics = ServiceMetrics::with_buckets(&[0.1, 1.0]);
        metrics.observe_latency(Duration::from_millis(50));
        metrics.observe_latency(Duration::from_millis(500));
        metrics.observe_latency(Duration::from_millis(5000));

        let hist = metrics.snapshot().request_duration;
        assert_eq!(hist.cumulative_counts, vec![1, 2]);
        assert_eq!(hist.count, 3);
        assert_relative_eq!(hist.sum, 5.55, epsilon = 1e-9);
        assert_relative_eq!(hist.mean_ms(), 1850.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_snapshot() {
        let snap = ServiceMetrics::new().snapshot();
        assert_eq!(snap.error_rate(), 0.0);
        assert_eq!(snap.request_duration.mean_ms(), 0.0);
        assert_eq!(snap.request_duration.cumulative_counts, vec![0; 11]);
        assert!(snap.uptime_seconds() >= 0);
    }

    #[test]
    fn test_concurrent_updates() {
        let metrics = Arc::new(ServiceMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        metrics.record_request();
                        metrics.record_render("neutral");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snap = metrics.snapshot();
        assert_eq!(snap.requests_total, 1000);
        assert_eq!(snap.renders_by_emotion["neutral"], 1000);
    }
}
