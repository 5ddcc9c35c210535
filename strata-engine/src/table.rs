//! Tidy result tables: one row per (scenario, participant, episode[, tick]).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strata_core::value::{Metrics, Value};

pub const SCENARIO: &str = "scenario";
pub const PARTICIPANT: &str = "participant";
pub const EPISODE_ID: &str = "episode_id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub scenario: String,
    pub participant: String,
    pub episode_id: u64,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl Row {
    /// Identifier columns take precedence over metric keys of the same name.
    pub fn new(
        scenario: impl Into<String>,
        participant: impl Into<String>,
        episode_id: u64,
        mut metrics: Metrics,
    ) -> Self {
        for key in [SCENARIO, PARTICIPANT, EPISODE_ID] {
            metrics.remove(key);
        }
        Self {
            scenario: scenario.into(),
            participant: participant.into(),
            episode_id,
            metrics,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metrics.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).and_then(Value::as_f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    rows: Vec<Row>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifier columns, then every metric key seen in any row, sorted.
    pub fn columns(&self) -> Vec<String> {
        let metric_keys: BTreeSet<&str> = self
            .rows
            .iter()
            .flat_map(|r| r.metrics.keys().map(String::as_str))
            .collect();
        [SCENARIO, PARTICIPANT, EPISODE_ID]
            .into_iter()
            .chain(metric_keys)
            .map(str::to_owned)
            .collect()
    }

    /// Numeric view of one metric column; rows lacking it yield `None`.
    pub fn column_f64(&self, key: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get_f64(key)).collect()
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl Extend<Row> for Table {
    fn extend<I: IntoIterator<Item = Row>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Winner of one (scenario, episode) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRow {
    pub scenario: String,
    pub episode_id: u64,
    pub winner: Value,
}
