//! Portrait daemon metrics
//!
//! Counts requests, failures and completed renders (per emotion), records
//! request latency in a fixed-bucket histogram, and renders everything in the
//! Prometheus text format for the `/metrics` endpoint.

pub mod collector;
pub mod export;
pub mod models;

// Re-export main types
pub use collector::ServiceMetrics;
pub use export::PrometheusExporter;
pub use models::{HistogramSnapshot, MetricsSnapshot, DEFAULT_LATENCY_BUCKETS};
