//! Prometheus text exposition

use crate::models::MetricsSnapshot;

/// Renders a [`MetricsSnapshot`] in the Prometheus text format
#[derive(Debug, Clone)]
pub struct PrometheusExporter {
    prefix: String,
}

impl PrometheusExporter {
    pub fn new() -> Self {
        Self {
            prefix: "portrait".to_string(),
        }
    }

    /// Set metrics name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn export(&self, snapshot: &MetricsSnapshot) -> String {
        let mut out = String::new();
        let p = &self.prefix;

        out.push_str(&format!("# HELP {p}_requests_total Total number of requests\n"));
        out.push_str(&format!("# TYPE {p}_requests_total counter\n"));
        out.push_str(&format!("{p}_requests_total {}\n", snapshot.requests_total));

        out.push_str(&format!("# HELP {p}_errors_total Total number of failed requests\n"));
        out.push_str(&format!("# TYPE {p}_errors_total counter\n"));
        out.push_str(&format!("{p}_errors_total {}\n", snapshot.errors_total));

        out.push_str(&format!("# HELP {p}_renders_total Completed renders by emotion\n"));
        out.push_str(&format!("# TYPE {p}_renders_total counter\n"));
        for (emotion, count) in &snapshot.renders_by_emotion {
            out.push_str(&format!("{p}_renders_total{{emotion=\"{}\"}} {}\n", escape_label(emotion), count));
        }

        let hist = &snapshot.request_duration;
        let name = format!("{p}_request_duration_seconds");
        out.push_str(&format!("# HELP {name} Request latency in seconds\n"));
        out.push_str(&format!("# TYPE {name} histogram\n"));
        for (bound, count) in hist.bounds.iter().zip(&hist.cumulative_counts) {
            out.push_str(&format!("{name}_bucket{{le=\"{}\"}} {}\n", bound, count));
        }
        out.push_str(&format!("{name}_bucket{{le=\"+Inf\"}} {}\n", hist.count));
        out.push_str(&format!("{name}_sum {}\n", hist.sum));
        out.push_str(&format!("{name}_count {}\n", hist.count));

        out.push_str(&format!("# HELP {p}_uptime_seconds Seconds since the collector started\n"));
        out.push_str(&format!("# TYPE {p}_uptime_seconds gauge\n"));
        out.push_str(&format!("{p}_uptime_seconds {}\n", snapshot.uptime_seconds()));

        out
    }
}

impl Default for PrometheusExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
