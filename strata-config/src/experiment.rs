//! Experiment runner configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct ExperimentConfig {
    /// Ticks per episode.
    #[validate(range(min = 1))]
    #[serde(default = "default_steps")]
    pub steps: u64,

    #[validate(range(min = 1))]
    #[serde(default = "default_episodes")]
    pub episodes: u64,

    /// Base seed; episode `i` runs with `seed + i`.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Restricts recorded per-step keys when set.
    #[serde(default)]
    pub per_step_metrics: Option<Vec<String>>,

    #[serde(default)]
    pub per_episode_metrics: Option<Vec<String>>,

    /// Passed to the model factory for every episode.
    #[serde(default)]
    pub model_params: BTreeMap<String, serde_json::Value>,
}

fn default_steps() -> u64 {
    100
}
fn default_episodes() -> u64 {
    10
}
fn default_seed() -> u64 {
    42
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            episodes: default_episodes(),
            seed: default_seed(),
            per_step_metrics: None,
            per_episode_metrics: None,
            model_params: BTreeMap::new(),
        }
    }
}
