use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand};
use opentelemetry::KeyValue;
use serde::Serialize;
use strata_config::StrataConfig;
use strata_core::model::{ModelFactory, SpecModelFactory};
use strata_core::value::Params;
use strata_engine::{metric_score, ModelSource, Tournament, VoteRow};
use strata_simulator::streams::demo_registry;
use strata_simulator::{simulate, Experiment, RunRecord};
use strata_telemetry::logging::EventLogger;
use strata_telemetry::metrics::MetricsRecorder;
use tracing::info;

use crate::build;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured graph for every episode and print the run record
    Simulate(SimulateArgs),
    /// Run every participant against every scenario and vote per episode
    Tournament(TournamentArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Configuration file; defaults to the `config/` hierarchy.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Overrides `experiment.seed`.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Fails unless the run digest equals this hex string.
    #[arg(long)]
    pub validate_hash: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TournamentArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Serialize)]
struct SimulateReport<'a> {
    digest: String,
    run: &'a RunRecord,
}

#[derive(Serialize)]
struct TournamentReport<'a> {
    voting: &'a str,
    votes: &'a [VoteRow],
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Simulate(args) => {
            let config = load(args.config.as_ref())?;
            EventLogger::init_with_level(&config.telemetry.log_level);
            run_simulate(&config, &args)
        }
        Commands::Tournament(args) => {
            let config = load(args.config.as_ref())?;
            EventLogger::init_with_level(&config.telemetry.log_level);
            run_tournament(&config, &args)
        }
    }
}

fn load(path: Option<&PathBuf>) -> anyhow::Result<StrataConfig> {
    let config = match path {
        Some(path) => StrataConfig::load_from_path(path),
        None => StrataConfig::load(),
    };
    config.context("failed to load configuration")
}

fn recorder(config: &StrataConfig) -> anyhow::Result<Option<Arc<MetricsRecorder>>> {
    if !config.telemetry.metrics {
        return Ok(None);
    }
    Ok(Some(Arc::new(MetricsRecorder::new()?)))
}

fn dump_metrics(recorder: Option<&Arc<MetricsRecorder>>) -> anyhow::Result<()> {
    if let Some(recorder) = recorder {
        eprintln!("{}", recorder.gather_metrics()?);
    }
    Ok(())
}

fn run_simulate(config: &StrataConfig, args: &SimulateArgs) -> anyhow::Result<()> {
    let exp_config = &config.experiment;
    let seed = args.seed.unwrap_or(exp_config.seed);
    let spec = build::graph_spec(&config.graph)?;
    let factory = SpecModelFactory::new(Arc::new(demo_registry()), spec)
        .with_ctx_data(build::params(&exp_config.model_params)?);
    let metrics = recorder(config)?;

    let mut exp = Experiment::new(Arc::new(factory))
        .steps(exp_config.steps)
        .episodes(exp_config.episodes)
        .seed(seed);
    if let Some(keys) = &exp_config.per_step_metrics {
        exp = exp.per_step_metrics(keys.clone());
    }
    if let Some(keys) = &exp_config.per_episode_metrics {
        exp = exp.per_episode_metrics(keys.clone());
    }
    if let Some(recorder) = &metrics {
        exp = exp.with_metrics(Arc::clone(recorder));
    }

    let run = simulate(&exp)?;
    let digest = run.digest()?;
    info!(digest = %digest, episodes = run.episodes.len(), "Simulation finished");
    EventLogger::log_event(
        "simulation_complete",
        vec![
            KeyValue::new("seed", seed as i64),
            KeyValue::new("episodes", run.episodes.len() as i64),
            KeyValue::new("digest", digest.clone()),
        ],
    );

    if let Some(expected) = &args.validate_hash {
        if !run.validate_hash(expected)? {
            bail!("State hash mismatch: expected {expected}, got {digest}");
        }
        info!("State hash validated");
    }

    let report = SimulateReport { digest, run: &run };
    println!("{}", serde_json::to_string_pretty(&report)?);
    dump_metrics(metrics.as_ref())
}

fn run_tournament(config: &StrataConfig, args: &TournamentArgs) -> anyhow::Result<()> {
    let exp_config = &config.experiment;
    let seed = args.seed.unwrap_or(exp_config.seed);
    let registry = Arc::new(demo_registry());
    let spec = build::graph_spec(&config.graph)?;
    let base = build::params(&exp_config.model_params)?;
    let scenarios = build::scenarios(&config.scenarios)?;
    let participants = build::participants(&config.tournament.participants)?;
    let voter = build::voter(config)?;
    let names: Vec<String> = participants.iter().map(|(name, _)| name.clone()).collect();
    let overrides: BTreeMap<String, Params> = participants.into_iter().collect();

    // Context data per cell: model params, then scenario, then participant.
    let mut tournament = Tournament::new(move |scenario, participant, ctx| {
        let mut data = base.clone();
        data.extend(ctx.iter().map(|(k, v)| (k.clone(), v.clone())));
        data.extend(scenario.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(extra) = overrides.get(participant) {
            data.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let factory = SpecModelFactory::new(Arc::clone(&registry), spec.clone()).with_ctx_data(data);
        Ok(ModelSource::Factory(Arc::new(factory) as Arc<dyn ModelFactory>))
    });
    let metrics = recorder(config)?;
    if let Some(recorder) = &metrics {
        tournament = tournament.with_metrics(Arc::clone(recorder));
    }

    let result = tournament.play(
        &scenarios,
        names.as_slice(),
        exp_config.steps,
        exp_config.episodes,
        seed,
        metric_score(config.tournament.score_metric.as_str()),
        &voter,
    )?;
    info!(
        scenarios = scenarios.len(),
        participants = names.len(),
        votes = result.votes.len(),
        "Tournament finished"
    );

    let report = TournamentReport {
        voting: &config.tournament.voting,
        votes: &result.votes,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    dump_metrics(metrics.as_ref())
}
