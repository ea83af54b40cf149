//! Pipeline observability.
//!
//! Metrics are collected in a local Prometheus registry and rendered in the
//! text exposition format on demand; nothing listens for requests.

pub mod metrics;

pub use metrics::PipelineMetrics;
