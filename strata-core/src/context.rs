//! Per-episode shared state.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::value::{DataBus, Metrics, Params, Value};

/// Clock, seeded randomness and data bus shared by all streams of one episode.
///
/// A context is created fresh for every episode and dropped once the episode's
/// metrics have been extracted. Streams must draw randomness from `rng` only;
/// any other source breaks reproducibility.
#[derive(Debug)]
pub struct Context {
    pub seed: u64,
    /// Tick counter; 0 before the first step.
    pub t: u64,
    pub rng: StdRng,
    pub data: DataBus,
    /// End-of-episode summaries, merged over graph metrics on extraction.
    pub episode: Metrics,
}

impl Context {
    pub fn new(seed: u64) -> Self {
        Self::with_data(seed, Params::new())
    }

    /// Creates a context whose data bus is pre-populated with `data`.
    pub fn with_data(seed: u64, data: Params) -> Self {
        Self {
            seed,
            t: 0,
            rng: StdRng::seed_from_u64(seed),
            data: DataBus::from(data),
            episode: Metrics::new(),
        }
    }

    #[inline]
    pub fn step_tick(&mut self) {
        self.t += 1;
    }

    /// Records an end-of-episode summary value.
    pub fn record_episode(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.episode.insert(key.into(), value.into());
    }
}
