/*!
# Strata Simulator

Drives models through fixed-length, independently seeded episodes and
generates the scenario sets those runs are parameterised by.

## Key Components:
- **Runner:** `run_episode`, `run_many` and `simulate` over any `ModelFactory`.
- **Scenarios:** named parameter bundles and Cartesian grids.
- **Demo streams:** a price feed, a momentum policy and a logistic population.
- **Demo model:** `DriftModel`, a model that does not use a stream graph at all.
- **Digests:** BLAKE3 hashes of run records for determinism checks.
*/

pub mod error;
pub mod models;
pub mod runner;
pub mod scenario;
pub mod streams;

pub use error::{RunError, ScenarioError};
pub use runner::{run_episode, run_instance, run_many, simulate, EpisodeRecord, Experiment, RunRecord};
pub use scenario::{make_grid, make_scenarios, Scenario, ScenarioSet};
