//! ## strata-simulator::runner
//! **Fixed-length episodes over independently seeded models**
//!
//! ### Expectations:
//! - Episode `i` of a run with base seed `S` is built with seed `S + i`
//! - Every episode gets a freshly built model; nothing carries over
//! - Per-step maps are recorded after every tick, then the episode summary once

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use strata_core::model::{Model, ModelFactory};
use strata_core::value::{Metrics, Params};
use strata_telemetry::MetricsRecorder;
use tracing::{debug, instrument};

use crate::error::RunError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub seed: u64,
    pub steps: u64,
    pub per_step: Vec<Metrics>,
    pub episode: Metrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub episodes: Vec<EpisodeRecord>,
}

impl EpisodeRecord {
    /// BLAKE3 hex digest of the JSON encoding.
    pub fn digest(&self) -> Result<String, RunError> {
        digest_of(self)
    }
}

impl RunRecord {
    pub fn digest(&self) -> Result<String, RunError> {
        digest_of(self)
    }

    /// Compares the digest against `expected`, ignoring hex case.
    pub fn validate_hash(&self, expected: &str) -> Result<bool, RunError> {
        Ok(self.digest()?.eq_ignore_ascii_case(expected.trim()))
    }
}

fn digest_of<T: Serialize>(value: &T) -> Result<String, RunError> {
    let bytes = serde_json::to_vec(value)?;
    Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
}

/// Key filters applied to recorded metric maps.
#[derive(Debug, Clone, Default)]
struct Selection<'a> {
    per_step: Option<&'a [String]>,
    per_episode: Option<&'a [String]>,
}

fn select(metrics: Metrics, keys: Option<&[String]>) -> Metrics {
    match keys {
        None => metrics,
        Some(keys) => metrics
            .into_iter()
            .filter(|(k, _)| keys.iter().any(|wanted| wanted == k))
            .collect(),
    }
}

/// Builds one model with `seed`, ticks it `steps` times and records its metrics.
pub fn run_episode(
    factory: &dyn ModelFactory,
    steps: u64,
    seed: u64,
    params: &Params,
) -> Result<EpisodeRecord, RunError> {
    run_episode_with(factory, steps, seed, params, &Selection::default(), None)
}

#[instrument(level = "debug", skip_all, fields(seed = seed, steps = steps))]
fn run_episode_with(
    factory: &dyn ModelFactory,
    steps: u64,
    seed: u64,
    params: &Params,
    selection: &Selection<'_>,
    recorder: Option<&MetricsRecorder>,
) -> Result<EpisodeRecord, RunError> {
    let started = Instant::now();
    let model = factory
        .build(seed, params)
        .map_err(|source| RunError::Build { seed, source })?;
    drive(model, steps, seed, selection, recorder, started)
}

/// Runs an already built model for one episode. `seed` is only recorded.
pub fn run_instance(model: Box<dyn Model>, steps: u64, seed: u64) -> Result<EpisodeRecord, RunError> {
    drive(model, steps, seed, &Selection::default(), None, Instant::now())
}

fn drive(
    mut model: Box<dyn Model>,
    steps: u64,
    seed: u64,
    selection: &Selection<'_>,
    recorder: Option<&MetricsRecorder>,
    started: Instant,
) -> Result<EpisodeRecord, RunError> {
    let mut per_step = Vec::new();
    for tick in 1..=steps {
        model
            .step()
            .map_err(|source| RunError::Step { seed, tick, source })?;
        per_step.push(select(model.metrics_step(), selection.per_step));
    }
    let episode = select(model.metrics_episode(), selection.per_episode);

    if let Some(recorder) = recorder {
        recorder.record_episode(steps, started.elapsed());
    }
    debug!(seed, steps, keys = episode.len(), "Episode finished");

    Ok(EpisodeRecord {
        seed,
        steps,
        per_step,
        episode,
    })
}

/// Runs `episodes` episodes in order, episode `i` seeded with `seed + i`.
pub fn run_many(
    factory: &dyn ModelFactory,
    steps: u64,
    episodes: u64,
    seed: u64,
    params: &Params,
) -> Result<RunRecord, RunError> {
    run_many_with(factory, steps, episodes, seed, params, &Selection::default(), None)
}

fn run_many_with(
    factory: &dyn ModelFactory,
    steps: u64,
    episodes: u64,
    seed: u64,
    params: &Params,
    selection: &Selection<'_>,
    recorder: Option<&MetricsRecorder>,
) -> Result<RunRecord, RunError> {
    let episodes = (0..episodes)
        .map(|i| {
            run_episode_with(
                factory,
                steps,
                seed.wrapping_add(i),
                params,
                selection,
                recorder,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RunRecord { episodes })
}

/// A complete run description: what to build and how often to run it.
#[derive(Clone)]
pub struct Experiment {
    pub factory: Arc<dyn ModelFactory>,
    pub steps: u64,
    pub episodes: u64,
    pub seed: u64,
    pub per_step_metrics: Option<Vec<String>>,
    pub per_episode_metrics: Option<Vec<String>>,
    pub model_params: Params,
    pub metrics: Option<Arc<MetricsRecorder>>,
}

impl Experiment {
    pub fn new(factory: Arc<dyn ModelFactory>) -> Self {
        Self {
            factory,
            steps: 100,
            episodes: 10,
            seed: 42,
            per_step_metrics: None,
            per_episode_metrics: None,
            model_params: Params::new(),
            metrics: None,
        }
    }

    pub fn steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    pub fn episodes(mut self, episodes: u64) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn per_step_metrics(mut self, keys: Vec<String>) -> Self {
        self.per_step_metrics = Some(keys);
        self
    }

    pub fn per_episode_metrics(mut self, keys: Vec<String>) -> Self {
        self.per_episode_metrics = Some(keys);
        self
    }

    pub fn model_params(mut self, params: Params) -> Self {
        self.model_params = params;
        self
    }

    pub fn with_metrics(mut self, recorder: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(recorder);
        self
    }
}

impl fmt::Debug for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("steps", &self.steps)
            .field("episodes", &self.episodes)
            .field("seed", &self.seed)
            .field("per_step_metrics", &self.per_step_metrics)
            .field("per_episode_metrics", &self.per_episode_metrics)
            .field("model_params", &self.model_params)
            .finish_non_exhaustive()
    }
}

/// Runs every episode of `exp`.
#[instrument(level = "info", skip_all, fields(steps = exp.steps, episodes = exp.episodes, seed = exp.seed))]
pub fn simulate(exp: &Experiment) -> Result<RunRecord, RunError> {
    let selection = Selection {
        per_step: exp.per_step_metrics.as_deref(),
        per_episode: exp.per_episode_metrics.as_deref(),
    };
    run_many_with(
        exp.factory.as_ref(),
        exp.steps,
        exp.episodes,
        exp.seed,
        &exp.model_params,
        &selection,
        exp.metrics.as_deref(),
    )
}
