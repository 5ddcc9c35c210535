//! Declarative stream graph: layers of `{name, kind, params}` entries.
//!
//! Parameter values are kept as raw JSON so that bound forms such as
//! `{from_data: key, fallback: value}` pass through untouched to the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct GraphConfig {
    #[validate(nested)]
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct LayerConfig {
    #[validate(nested)]
    #[serde(default)]
    pub streams: Vec<StreamConfig>,
}

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct StreamConfig {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    pub kind: String,

    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}
