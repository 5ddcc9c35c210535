//! # Strata Telemetry
//!
//! Structured run logging and Prometheus counters for simulation runs.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
