use strata_core::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Model construction failed for seed {seed}: {source}")]
    Build {
        seed: u64,
        #[source]
        source: ModelError,
    },

    #[error("Episode with seed {seed} failed at tick {tick}: {source}")]
    Step {
        seed: u64,
        tick: u64,
        #[source]
        source: ModelError,
    },

    #[error("Run record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RunError {
    /// Seed of the episode that failed, when the failure belongs to one.
    pub fn seed(&self) -> Option<u64> {
        match self {
            RunError::Build { seed, .. } | RunError::Step { seed, .. } => Some(*seed),
            RunError::Encode(_) => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("Duplicate scenario name '{0}'")]
    DuplicateName(String),
}
