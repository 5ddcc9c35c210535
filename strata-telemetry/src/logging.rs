//! ## strata-telemetry::logging
//! **Structured logging with tracing and OpenTelemetry attributes**
//!
//! ### Expectations:
//! - One subscriber per process; repeated initialisation is a no-op
//! - Filter taken from `RUST_LOG` when set, otherwise from the caller
//! - Output goes to stderr; stdout belongs to command results
//! - Run lifecycle events carry their attributes as `KeyValue` pairs

use opentelemetry::KeyValue;
use tracing::info_span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    pub fn init() {
        Self::init_with_level("info")
    }

    /// Installs the global subscriber with `level` as the fallback filter.
    pub fn init_with_level(level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let installed = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init();
        if installed.is_err() {
            tracing::debug!("Global subscriber already installed");
        }
    }

    #[inline]
    pub fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!("run_event", event_type = event_type, otel.kind = "INTERNAL");
        let _entered = span.enter();
        tracing::info!(metadata = ?metadata, "Run event recorded");
    }
}
