//! Tournament configuration: participants, scoring metric and voting rule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct TournamentConfig {
    /// One of `argmax`, `majority`, `weighted`, `borda`.
    #[validate(custom(function = validation::validate_voting_rule))]
    #[serde(default = "default_voting")]
    pub voting: String,

    /// Episode metric used as each participant's score.
    #[validate(length(min = 1))]
    #[serde(default = "default_score_metric")]
    pub score_metric: String,

    #[validate(nested)]
    #[serde(default)]
    pub participants: Vec<ParticipantConfig>,

    /// Per-participant weights for the `weighted` rule.
    #[validate(custom(function = validation::validate_weights))]
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

fn default_voting() -> String {
    "argmax".into()
}
fn default_score_metric() -> String {
    "score".into()
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            voting: default_voting(),
            score_metric: default_score_metric(),
            participants: Vec::new(),
            weights: BTreeMap::new(),
        }
    }
}

/// A named participant and the parameters layered over each scenario's.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Default)]
pub struct ParticipantConfig {
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}
