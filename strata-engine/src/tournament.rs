//! ## strata-engine::tournament
//! **Arena runs scored per participant and voted per (scenario, episode)**
//!
//! Groups are visited in sorted (scenario name, episode) order; within a group
//! participants keep the order they were supplied in, which is the order the
//! voter sees them in.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use strata_core::error::ModelError;
use strata_core::value::{Params, Value};
use strata_simulator::{Scenario, ScenarioSet};
use strata_telemetry::MetricsRecorder;
use tracing::{debug, instrument, warn};

use crate::arena::{Arena, ModelSource};
use crate::error::TournamentError;
use crate::table::{Row, Table, VoteRow};
use crate::voting::Voter;

/// Column added to every per-episode row.
pub const SCORE: &str = "score";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayResult {
    pub per_step: Table,
    /// Per-episode rows with a `score` column.
    pub per_episode: Table,
    pub votes: Vec<VoteRow>,
}

#[derive(Clone)]
pub struct Tournament {
    arena: Arena,
}

impl Tournament {
    pub fn new<F>(builder: F) -> Self
    where
        F: Fn(&Scenario, &str, &Params) -> Result<ModelSource, ModelError> + Send + Sync + 'static,
    {
        Self {
            arena: Arena::new(builder),
        }
    }

    pub fn with_metrics(self, recorder: Arc<MetricsRecorder>) -> Self {
        Self {
            arena: self.arena.with_metrics(recorder),
        }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Runs the arena, scores each per-episode row with `score_fn(row,
    /// participant)` and votes one winner per (scenario, episode).
    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "info", skip_all, fields(voter = ?voter))]
    pub fn play<P, S>(
        &self,
        scenarios: &ScenarioSet,
        participants: &[P],
        steps: u64,
        episodes: u64,
        seed: u64,
        score_fn: S,
        voter: &Voter,
    ) -> Result<PlayResult, TournamentError>
    where
        P: AsRef<str>,
        S: Fn(&Row, &str) -> f64,
    {
        let out = self
            .arena
            .run(scenarios, participants, steps, episodes, seed, None)?;
        let mut per_episode = out.per_episode;

        let mut groups: BTreeMap<(String, u64), Vec<(String, f64)>> = BTreeMap::new();
        for row in per_episode.rows_mut() {
            let score = score_fn(row, &row.participant);
            if !score.is_finite() {
                return Err(TournamentError::NonFiniteScore {
                    scenario: row.scenario.clone(),
                    participant: row.participant.clone(),
                    episode_id: row.episode_id,
                });
            }
            row.metrics.insert(SCORE.to_string(), Value::Float(score));
            groups
                .entry((row.scenario.clone(), row.episode_id))
                .or_default()
                .push((row.participant.clone(), score));
        }

        let votes = groups
            .into_iter()
            .map(|((scenario, episode_id), scores)| {
                let winner = voter.vote(&scores).unwrap_or_else(|| {
                    warn!(scenario = %scenario, episode_id, "Voter produced no winner");
                    Value::Null
                });
                debug!(scenario = %scenario, episode_id, winner = %winner, "Group voted");
                VoteRow {
                    scenario,
                    episode_id,
                    winner,
                }
            })
            .collect();

        Ok(PlayResult {
            per_step: out.per_step,
            per_episode,
            votes,
        })
    }
}

impl fmt::Debug for Tournament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tournament").field("arena", &self.arena).finish()
    }
}

/// Score function reading one episode metric; missing or non-numeric is 0.
pub fn metric_score(key: impl Into<String>) -> impl Fn(&Row, &str) -> f64 {
    let key = key.into();
    move |row: &Row, _participant: &str| row.get_f64(&key).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArenaError;
    use strata_core::model::Model;
    use strata_simulator::make_grid;
    use strata_simulator::models::DriftModel;
    use tracing_test::traced_test;

    /// Participant name encodes its drift: "d2" drifts by 2 per tick.
    fn tournament() -> Tournament {
        Tournament::new(|scenario, participant, _| {
            let drift: f64 = participant[1..].parse().unwrap_or(0.0);
            let start = scenario.params.get("start").and_then(Value::as_f64).unwrap_or(0.0);
            Ok(ModelSource::factory(
                move |seed: u64, _: &Params| -> Result<Box<dyn Model>, ModelError> {
                    Ok(Box::new(DriftModel::new(start, drift, 0.0, seed)?))
                },
            ))
        })
    }

    fn scenarios() -> ScenarioSet {
        let grid = BTreeMap::from([(
            "start".to_string(),
            vec![Value::Float(0.0), Value::Float(-100.0)],
        )]);
        make_grid(&grid, None, None)
    }

    #[test]
    fn argmax_elects_highest_score() {
        let result = tournament()
            .play(
                &scenarios(),
                &["d1", "d3", "d2"],
                5,
                2,
                0,
                metric_score("final_abs_x"),
                &Voter::Argmax,
            )
            .unwrap();

        assert_eq!(result.votes.len(), 4);
        let groups: Vec<_> = result
            .votes
            .iter()
            .map(|v| (v.scenario.as_str(), v.episode_id))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("start=-100.0", 0),
                ("start=-100.0", 1),
                ("start=0.0", 0),
                ("start=0.0", 1)
            ]
        );
        // From 0 the fastest drifter wins; from -100 the slowest stays furthest away.
        assert_eq!(result.votes[2].winner, Value::from("d3"));
        assert_eq!(result.votes[0].winner, Value::from("d1"));
        assert!(result.per_episode.iter().all(|r| r.get(SCORE).is_some()));
        assert_eq!(result.per_step.len(), 2 * 3 * 2 * 5);
    }

    #[test]
    fn ties_go_to_first_participant() {
        let result = tournament()
            .play(
                &scenarios(),
                &["d2", "d2x", "d9"],
                3,
                1,
                0,
                |_: &Row, _: &str| 1.0,
                &Voter::Argmax,
            )
            .unwrap();
        assert!(result.votes.iter().all(|v| v.winner == Value::from("d2")));
    }

    #[test]
    fn score_fn_sees_participant() {
        let result = tournament()
            .play(
                &scenarios(),
                &["d1", "d2"],
                2,
                1,
                0,
                |_: &Row, p: &str| if p == "d1" { 10.0 } else { 0.0 },
                &Voter::Argmax,
            )
            .unwrap();
        assert!(result.votes.iter().all(|v| v.winner == Value::from("d1")));
    }

    #[test]
    fn majority_reports_label() {
        let voter = Voter::Majority(Arc::new(|p, _| p == "d1"));
        let result = tournament()
            .play(&scenarios(), &["d1", "d2"], 1, 1, 0, metric_score("final_abs_x"), &voter)
            .unwrap();
        assert!(result.votes.iter().all(|v| v.winner == Value::Int(1)));
    }

    #[traced_test]
    #[test]
    fn missing_winner_is_null() {
        let voter = Voter::custom(|_| None);
        let result = tournament()
            .play(&scenarios(), &["d1"], 1, 1, 0, metric_score("x"), &voter)
            .unwrap();
        assert!(result.votes.iter().all(|v| v.winner.is_null()));
        assert!(logs_contain("Voter produced no winner"));
    }

    #[test]
    fn non_finite_scores_are_rejected() {
        let err = tournament()
            .play(
                &scenarios(),
                &["d1"],
                1,
                1,
                0,
                |_: &Row, _: &str| f64::NAN,
                &Voter::Argmax,
            )
            .unwrap_err();
        assert!(matches!(err, TournamentError::NonFiniteScore { .. }));
    }

    #[test]
    fn arena_failures_propagate() {
        let t = Tournament::new(|_, _, _| Err(ModelError::Failed("no model".into())));
        let err = t
            .play(&scenarios(), &["d1"], 1, 1, 0, metric_score("x"), &Voter::Argmax)
            .unwrap_err();
        assert!(matches!(err, TournamentError::Arena(ArenaError::Build { .. })));
    }
}
