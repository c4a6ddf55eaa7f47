// Observability: metric names and per-phase recording helpers

pub mod metrics;

pub use metrics::MetricName;
