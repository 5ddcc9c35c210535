//! Scenario generation: a Cartesian grid, an explicit list, or both.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct ScenariosConfig {
    /// Parameter name to candidate values.
    #[validate(custom(function = validation::validate_grid))]
    #[serde(default)]
    pub grid: BTreeMap<String, Vec<serde_json::Value>>,

    /// Explicit parameter maps, appended after the grid.
    #[serde(default)]
    pub list: Vec<BTreeMap<String, serde_json::Value>>,

    /// Key in a list entry that supplies the scenario name.
    #[serde(default)]
    pub name_key: Option<String>,

    /// Labels attached to every generated scenario.
    #[serde(default)]
    pub tags: BTreeMap<String, serde_json::Value>,
}

impl ScenariosConfig {
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty() && self.list.is_empty()
    }
}
