//! Conversion from raw configuration sections to engine types.

use std::collections::BTreeMap;

use anyhow::{bail, Context as _};
use strata_config::{GraphConfig, ParticipantConfig, ScenariosConfig, StrataConfig};
use strata_core::spec::GraphSpec;
use strata_core::value::{Params, Value};
use strata_engine::{Voter, VotingRule};
use strata_simulator::streams::market_graph;
use strata_simulator::{make_grid, make_scenarios, Scenario, ScenarioSet};

type JsonMap = BTreeMap<String, serde_json::Value>;

pub fn params(raw: &JsonMap) -> anyhow::Result<Params> {
    raw.iter()
        .map(|(k, v)| {
            let value: Value = serde_json::from_value(v.clone())
                .with_context(|| format!("parameter '{k}' is not a scalar or numeric list"))?;
            Ok((k.clone(), value))
        })
        .collect()
}

/// The configured graph, or the demo market graph when none is configured.
pub fn graph_spec(graph: &GraphConfig) -> anyhow::Result<GraphSpec> {
    if graph.layers.is_empty() {
        return Ok(market_graph(0.03, 0.05, 0.05));
    }
    let json = serde_json::to_value(&graph.layers)?;
    serde_json::from_value(json).context("invalid graph definition")
}

/// Grid scenarios followed by list scenarios; a single `default` scenario
/// when neither is configured.
pub fn scenarios(config: &ScenariosConfig) -> anyhow::Result<ScenarioSet> {
    let tags = params(&config.tags)?;
    if config.is_empty() {
        let mut default = Scenario::new("default", Params::new());
        default.tags = tags;
        return Ok(ScenarioSet::new(vec![default]));
    }

    let mut set = ScenarioSet::default();
    if !config.grid.is_empty() {
        let grid = config
            .grid
            .iter()
            .map(|(k, values)| {
                let values = values
                    .iter()
                    .map(|v| serde_json::from_value(v.clone()))
                    .collect::<Result<Vec<Value>, _>>()
                    .with_context(|| format!("grid axis '{k}' has an unsupported value"))?;
                Ok((k.clone(), values))
            })
            .collect::<anyhow::Result<BTreeMap<_, _>>>()?;
        set.extend(make_grid(&grid, None, Some(&tags)));
    }

    let items = config.list.iter().map(params).collect::<anyhow::Result<Vec<_>>>()?;
    set.extend(
        make_scenarios(items, config.name_key.as_deref())
            .into_iter()
            .map(|mut sc| {
                sc.tags = tags.clone();
                sc
            }),
    );
    Ok(set)
}

pub fn participants(list: &[ParticipantConfig]) -> anyhow::Result<Vec<(String, Params)>> {
    if list.is_empty() {
        bail!("tournament.participants must name at least one participant");
    }
    list.iter()
        .map(|p| Ok((p.name.clone(), params(&p.params)?)))
        .collect()
}

pub fn voter(config: &StrataConfig) -> anyhow::Result<Voter> {
    let rule: VotingRule = config.tournament.voting.parse()?;
    Ok(Voter::from_rule(rule, config.tournament.weights.clone()))
}
