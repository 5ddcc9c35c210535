//! ## strata-simulator::scenario
//! **Named parameter bundles, individually or as a Cartesian grid**
//!
//! Default names are `key=value` pairs joined by `|`, keys sorted; an empty
//! parameter map is named `default`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use strata_core::value::{Params, Value};

use crate::error::ScenarioError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub params: Params,
    /// Labels for filtering and reporting; never passed to models.
    #[serde(default)]
    pub tags: Params,
}

impl Scenario {
    pub fn new(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
            tags: Params::new(),
        }
    }

    /// Copy with `updates` layered over the parameters. Name and tags are kept.
    pub fn with_updates(&self, updates: Params) -> Self {
        let mut params = self.params.clone();
        params.extend(updates);
        Self {
            name: self.name.clone(),
            params,
            tags: self.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    /// Scenarios whose params equal every entry of `equals`. A missing
    /// parameter compares as [`Value::Null`].
    pub fn filter(&self, equals: &Params) -> ScenarioSet {
        self.scenarios
            .iter()
            .filter(|sc| {
                equals
                    .iter()
                    .all(|(k, v)| sc.params.get(k).unwrap_or(&Value::Null) == v)
            })
            .cloned()
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scenario> {
        self.scenarios.iter()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn push(&mut self, scenario: Scenario) {
        self.scenarios.push(scenario);
    }

    pub fn as_slice(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Names must be unique for per-scenario results to be comparable.
    pub fn ensure_unique_names(&self) -> Result<(), ScenarioError> {
        let mut seen = HashSet::with_capacity(self.scenarios.len());
        for sc in &self.scenarios {
            if !seen.insert(sc.name.as_str()) {
                return Err(ScenarioError::DuplicateName(sc.name.clone()));
            }
        }
        Ok(())
    }
}

impl FromIterator<Scenario> for ScenarioSet {
    fn from_iter<I: IntoIterator<Item = Scenario>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<Scenario> for ScenarioSet {
    fn extend<I: IntoIterator<Item = Scenario>>(&mut self, iter: I) {
        self.scenarios.extend(iter);
    }
}

impl IntoIterator for ScenarioSet {
    type Item = Scenario;
    type IntoIter = std::vec::IntoIter<Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.into_iter()
    }
}

impl<'a> IntoIterator for &'a ScenarioSet {
    type Item = &'a Scenario;
    type IntoIter = std::slice::Iter<'a, Scenario>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenarios.iter()
    }
}

pub fn default_name(params: &Params) -> String {
    if params.is_empty() {
        return "default".to_string();
    }
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("|")
}

/// One scenario per element of the Cartesian product of `grid`, keys taken
/// in sorted order with the first key varying slowest.
pub fn make_grid(
    grid: &BTreeMap<String, Vec<Value>>,
    name_fn: Option<&dyn Fn(&Params) -> String>,
    base_tags: Option<&Params>,
) -> ScenarioSet {
    let mut combos = vec![Params::new()];
    for (key, values) in grid {
        combos = combos
            .iter()
            .flat_map(|combo| {
                values.iter().map(move |v| {
                    let mut next = combo.clone();
                    next.insert(key.clone(), v.clone());
                    next
                })
            })
            .collect();
    }

    let tags = base_tags.cloned().unwrap_or_default();
    combos
        .into_iter()
        .map(|params| Scenario {
            name: name_fn.map_or_else(|| default_name(&params), |f| f(&params)),
            params,
            tags: tags.clone(),
        })
        .collect()
}

/// One scenario per map. With `name_key`, that entry (when present) is
/// removed from the params and used as the name.
pub fn make_scenarios<I>(items: I, name_key: Option<&str>) -> ScenarioSet
where
    I: IntoIterator<Item = Params>,
{
    items
        .into_iter()
        .map(|mut params| {
            let explicit = name_key.and_then(|key| params.remove(key));
            let name = match explicit {
                Some(v) => v.to_string(),
                None => default_name(&params),
            };
            Scenario::new(name, params)
        })
        .collect()
}
