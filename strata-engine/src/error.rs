use strata_core::ModelError;
use strata_simulator::{RunError, ScenarioError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("Builder failed for scenario '{scenario}', participant '{participant}': {source}")]
    Build {
        scenario: String,
        participant: String,
        #[source]
        source: ModelError,
    },

    #[error("Run failed for scenario '{scenario}', participant '{participant}': {source}")]
    Run {
        scenario: String,
        participant: String,
        /// Index of the failing episode within the cell, when known.
        episode_id: Option<u64>,
        #[source]
        source: RunError,
    },

    #[error(
        "Builder returned a single model instance for scenario '{scenario}', participant \
         '{participant}' but {episodes} episodes were requested"
    )]
    SharedInstance {
        scenario: String,
        participant: String,
        episodes: u64,
    },

    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error(
        "Score for participant '{participant}' in scenario '{scenario}', episode {episode_id} \
         is not a finite number"
    )]
    NonFiniteScore {
        scenario: String,
        participant: String,
        episode_id: u64,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum VotingError {
    #[error("Unknown voting rule: {0}")]
    UnknownRule(String),
}
