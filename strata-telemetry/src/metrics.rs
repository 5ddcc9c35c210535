//! ## strata-telemetry::metrics
//! **Prometheus counters for episodes, ticks and arena cells**

use std::time::Duration;

use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub episodes: Counter,
    pub ticks: Counter,
    pub arena_cells: Counter,
    pub episode_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let episodes = Counter::new("strata_episodes_total", "Episodes run to completion")?;
        let ticks = Counter::new("strata_ticks_total", "Model ticks executed")?;
        let arena_cells = Counter::new(
            "strata_arena_cells_total",
            "Scenario x participant cells completed",
        )?;
        let episode_duration = Histogram::with_opts(
            HistogramOpts::new(
                "strata_episode_duration_seconds",
                "Wall-clock time per episode",
            )
            .buckets(vec![0.001, 0.01, 0.1, 1.0, 10.0]),
        )?;

        registry.register(Box::new(episodes.clone()))?;
        registry.register(Box::new(ticks.clone()))?;
        registry.register(Box::new(arena_cells.clone()))?;
        registry.register(Box::new(episode_duration.clone()))?;

        Ok(Self {
            registry,
            episodes,
            ticks,
            arena_cells,
            episode_duration,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn record_episode(&self, steps: u64, elapsed: Duration) {
        self.episodes.inc();
        self.ticks.inc_by(steps as f64);
        self.episode_duration.observe(elapsed.as_secs_f64());
    }

    pub fn inc_arena_cells(&self) {
        self.arena_cells.inc();
    }
}
