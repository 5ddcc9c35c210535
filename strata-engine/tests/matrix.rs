//! End-to-end runs of declarative graphs through the arena and tournament.

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use strata_core::model::SpecModelFactory;
use strata_core::registry::StreamRegistry;
use strata_core::value::{Params, Value};
use strata_engine::{metric_score, Arena, ModelSource, Tournament, Voter};
use strata_simulator::streams::{demo_registry, market_graph};
use strata_simulator::{make_grid, ScenarioSet};

/// Scenario params and participant alpha feed the graph's context data.
fn market_builder(
    registry: Arc<StreamRegistry>,
) -> impl Fn(&strata_simulator::Scenario, &str, &Params) -> Result<ModelSource, strata_core::ModelError>
       + Send
       + Sync
       + 'static {
    move |scenario, participant, _ctx| {
        let drift = scenario.params.get("drift").and_then(Value::as_f64).unwrap_or(0.0);
        let noise = scenario.params.get("noise").and_then(Value::as_f64).unwrap_or(0.1);
        let alpha = match participant {
            "cautious" => 0.01,
            "bold" => 0.5,
            _ => 0.1,
        };
        let factory = SpecModelFactory::new(registry.clone(), market_graph(drift, noise, alpha));
        Ok(ModelSource::factory(factory))
    }
}

fn grid() -> ScenarioSet {
    let grid = BTreeMap::from([
        ("drift".to_string(), vec![Value::Float(-0.1), Value::Float(0.2)]),
        ("noise".to_string(), vec![Value::Float(0.05), Value::Float(0.5)]),
    ]);
    make_grid(&grid, None, None)
}

#[test]
fn table_shape_is_the_full_matrix() {
    let arena = Arena::new(market_builder(Arc::new(demo_registry())));
    let participants = ["cautious", "bold", "plain"];
    let out = arena.run(&grid(), &participants, 7, 3, 1, None).unwrap();

    let (s, p, e, t) = (4, participants.len(), 3, 7);
    assert_eq!(out.per_step.len(), s * p * e * t);
    assert_eq!(out.per_episode.len(), s * p * e);
    assert!(out
        .per_step
        .iter()
        .all(|r| r.get("price.price").is_some() && r.get("policy.pnl").is_some()));
}

#[test]
fn same_seed_same_tables() {
    let arena = Arena::new(market_builder(Arc::new(demo_registry())));
    let a = arena.run(&grid(), &["bold"], 10, 2, 5, None).unwrap();
    let b = arena.run(&grid(), &["bold"], 10, 2, 5, None).unwrap();
    assert_eq!(a, b);

    let c = arena.run(&grid(), &["bold"], 10, 2, 6, None).unwrap();
    assert_ne!(a.per_step, c.per_step);
    // Episode 0 of seed 6 is episode 1 of seed 5.
    let ep = |table: &strata_engine::Table, scenario: &str, id: u64| {
        table
            .iter()
            .find(|r| r.scenario == scenario && r.episode_id == id)
            .map(|r| r.metrics.clone())
    };
    let name = "drift=0.2|noise=0.5";
    assert_eq!(ep(&a.per_episode, name, 1), ep(&c.per_episode, name, 0));
}

#[test]
fn tournament_votes_every_group() {
    let tournament = Tournament::new(market_builder(Arc::new(demo_registry())));
    let result = tournament
        .play(
            &grid(),
            &["cautious", "bold"],
            20,
            2,
            0,
            metric_score("policy.final_pnl"),
            &Voter::Argmax,
        )
        .unwrap();
    assert_eq!(result.votes.len(), 4 * 2);
    for vote in &result.votes {
        let winner = vote.winner.as_str().unwrap();
        assert!(winner == "cautious" || winner == "bold");
        let best = result
            .per_episode
            .iter()
            .filter(|r| r.scenario == vote.scenario && r.episode_id == vote.episode_id)
            .map(|r| r.get_f64("score").unwrap())
            .fold(f64::MIN, f64::max);
        let winner_score = result
            .per_episode
            .iter()
            .find(|r| {
                r.scenario == vote.scenario && r.episode_id == vote.episode_id && r.participant == winner
            })
            .and_then(|r| r.get_f64("score"))
            .unwrap();
        assert_eq!(winner_score, best);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn shape_law_holds(scenarios in 1usize..4, participants in 1usize..4, episodes in 0u64..3, steps in 0u64..5) {
        let grid = BTreeMap::from([(
            "drift".to_string(),
            (0..scenarios).map(|i| Value::Float(i as f64 / 10.0)).collect(),
        )]);
        let set = make_grid(&grid, None, None);
        let names: Vec<String> = (0..participants).map(|i| format!("p{i}")).collect();
        let arena = Arena::new(market_builder(Arc::new(demo_registry())));
        let out = arena.run(&set, &names, steps, episodes, 0, None).unwrap();
        prop_assert_eq!(out.per_step.len() as u64, scenarios as u64 * participants as u64 * episodes * steps);
        prop_assert_eq!(out.per_episode.len() as u64, scenarios as u64 * participants as u64 * episodes);
    }
}
