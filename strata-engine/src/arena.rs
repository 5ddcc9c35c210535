//! ## strata-engine::arena
//! **Scenario x participant x episode execution matrix**
//!
//! ### Row order:
//! scenario, then participant, then episode, then tick, each in the order
//! supplied. Output tables are reproducible row for row for a given seed.

use std::fmt;
use std::sync::Arc;

use opentelemetry::KeyValue;
use strata_core::error::ModelError;
use strata_core::model::{Model, ModelFactory};
use strata_core::value::Params;
use strata_simulator::runner::{run_instance, simulate, Experiment, RunRecord};
use strata_simulator::{RunError, Scenario, ScenarioSet};
use strata_telemetry::{EventLogger, MetricsRecorder};
use tracing::{info, instrument};

use crate::error::ArenaError;
use crate::table::{Row, Table};

/// What a builder hands back for one (scenario, participant) cell.
pub enum ModelSource {
    /// Called once per episode with that episode's seed.
    Factory(Arc<dyn ModelFactory>),
    /// A pre-built model; usable for a single episode only.
    Instance(Box<dyn Model>),
}

impl ModelSource {
    pub fn factory<F: ModelFactory + 'static>(factory: F) -> Self {
        ModelSource::Factory(Arc::new(factory))
    }
}

impl fmt::Debug for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Factory(_) => f.write_str("Factory(..)"),
            ModelSource::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// `(scenario, participant, context) -> model source`.
pub type BuildModelFn =
    dyn Fn(&Scenario, &str, &Params) -> Result<ModelSource, ModelError> + Send + Sync;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArenaOutput {
    pub per_step: Table,
    pub per_episode: Table,
}

#[derive(Clone)]
pub struct Arena {
    builder: Arc<BuildModelFn>,
    metrics: Option<Arc<MetricsRecorder>>,
}

impl Arena {
    pub fn new<F>(builder: F) -> Self
    where
        F: Fn(&Scenario, &str, &Params) -> Result<ModelSource, ModelError> + Send + Sync + 'static,
    {
        Self {
            builder: Arc::new(builder),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, recorder: Arc<MetricsRecorder>) -> Self {
        self.metrics = Some(recorder);
        self
    }

    /// Runs every participant against every scenario for `episodes` episodes
    /// of `steps` ticks, episode `i` seeded with `seed + i`.
    #[instrument(
        level = "info",
        skip_all,
        fields(
            scenarios = scenarios.len(),
            participants = participants.len(),
            steps = steps,
            episodes = episodes,
            seed = seed
        )
    )]
    pub fn run<P: AsRef<str>>(
        &self,
        scenarios: &ScenarioSet,
        participants: &[P],
        steps: u64,
        episodes: u64,
        seed: u64,
        ctx: Option<&Params>,
    ) -> Result<ArenaOutput, ArenaError> {
        scenarios.ensure_unique_names()?;
        let ctx = ctx.cloned().unwrap_or_default();
        let mut out = ArenaOutput::default();

        for scenario in scenarios {
            for participant in participants {
                let participant = participant.as_ref();
                let record = self.run_cell(scenario, participant, steps, episodes, seed, &ctx)?;
                for (episode_id, episode) in (0u64..).zip(record.episodes) {
                    out.per_step.extend(episode.per_step.into_iter().map(|metrics| {
                        Row::new(&scenario.name, participant, episode_id, metrics)
                    }));
                    out.per_episode.push(Row::new(
                        &scenario.name,
                        participant,
                        episode_id,
                        episode.episode,
                    ));
                }
                if let Some(recorder) = &self.metrics {
                    recorder.inc_arena_cells();
                }
                info!(scenario = %scenario.name, participant, "Arena cell complete");
            }
        }

        EventLogger::log_event(
            "arena_complete",
            vec![
                KeyValue::new("scenarios", scenarios.len() as i64),
                KeyValue::new("participants", participants.len() as i64),
                KeyValue::new("episode_rows", out.per_episode.len() as i64),
            ],
        );
        Ok(out)
    }

    fn run_cell(
        &self,
        scenario: &Scenario,
        participant: &str,
        steps: u64,
        episodes: u64,
        seed: u64,
        ctx: &Params,
    ) -> Result<RunRecord, ArenaError> {
        let source =
            (self.builder)(scenario, participant, ctx).map_err(|source| ArenaError::Build {
                scenario: scenario.name.clone(),
                participant: participant.to_owned(),
                source,
            })?;
        let run_failed = |source: RunError| ArenaError::Run {
            scenario: scenario.name.clone(),
            participant: participant.to_owned(),
            episode_id: source.seed().map(|s| s.wrapping_sub(seed)),
            source,
        };

        match source {
            ModelSource::Factory(factory) => {
                let mut exp = Experiment::new(factory)
                    .steps(steps)
                    .episodes(episodes)
                    .seed(seed);
                if let Some(recorder) = &self.metrics {
                    exp = exp.with_metrics(recorder.clone());
                }
                simulate(&exp).map_err(run_failed)
            }
            ModelSource::Instance(_) if episodes > 1 => Err(ArenaError::SharedInstance {
                scenario: scenario.name.clone(),
                participant: participant.to_owned(),
                episodes,
            }),
            ModelSource::Instance(_) if episodes == 0 => Ok(RunRecord::default()),
            ModelSource::Instance(model) => {
                let episode = run_instance(model, steps, seed).map_err(run_failed)?;
                Ok(RunRecord {
                    episodes: vec![episode],
                })
            }
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
