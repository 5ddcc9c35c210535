//! # Strata Configuration System
//!
//! Hierarchical configuration for experiments, tournaments and stream graphs.
//!
//! ## Features
//! - **Layered sources**: defaults, YAML files, then `STRATA_*` environment overrides
//! - **Validation**: every section is checked with `validator` before use
//! - **Engine independence**: graph and scenario values stay raw JSON until the
//!   caller converts them

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod experiment;
mod graph;
mod scenarios;
mod telemetry;
mod tournament;
mod validation;

pub use error::ConfigError;
pub use experiment::ExperimentConfig;
pub use graph::{GraphConfig, LayerConfig, StreamConfig};
pub use scenarios::ScenariosConfig;
pub use telemetry::TelemetryConfig;
pub use tournament::{ParticipantConfig, TournamentConfig};
pub use validation::{LOG_LEVELS, VOTING_RULES};

const ENV_PREFIX: &str = "STRATA_";

#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct StrataConfig {
    #[validate(nested)]
    #[serde(default)]
    pub experiment: ExperimentConfig,

    #[validate(nested)]
    #[serde(default)]
    pub tournament: TournamentConfig,

    #[validate(nested)]
    #[serde(default)]
    pub scenarios: ScenariosConfig,

    #[validate(nested)]
    #[serde(default)]
    pub graph: GraphConfig,

    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl StrataConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/strata.yaml`, skipped if missing
    /// 3. `config/<STRATA_ENV>.yaml`, skipped if missing
    /// 4. `STRATA_*` environment variables, nested with `__`
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(StrataConfig::default()));

        if Path::new("config/strata.yaml").exists() {
            figment = figment.merge(Yaml::file("config/strata.yaml"));
        }

        if let Ok(env) = std::env::var("STRATA_ENV") {
            let env_file = format!("config/{}.yaml", env);
            if Path::new(&env_file).exists() {
                figment = figment.merge(Yaml::file(env_file));
            }
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file, still honouring `STRATA_*` overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        let figment =
            Figment::from(Serialized::defaults(StrataConfig::default())).merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("strata-{}-{}.yaml", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn default_config_validates() {
        let config = StrataConfig::default();
        config.validate().expect("Default config should validate");
        assert_eq!(config.experiment.steps, 100);
        assert_eq!(config.experiment.episodes, 10);
        assert_eq!(config.tournament.voting, "argmax");
    }

    #[test]
    fn yaml_sections_are_loaded() {
        let path = write_temp(
            "sections",
            r#"
experiment:
  steps: 25
tournament:
  voting: weighted
  score_metric: wealth
  participants:
    - name: cautious
      params: { risk: 0.1 }
    - name: bold
      params: { risk: 0.9 }
  weights: { cautious: 1.0, bold: 2.0 }
scenarios:
  grid:
    drift: [0.0, 0.1]
    volatility: [1.0]
graph:
  layers:
    - streams:
        - { name: price, kind: random_walk, params: { drift: 0.05 } }
    - streams:
        - name: policy
          kind: momentum
          params:
            price_key: { from_data: price_key, fallback: price.price }
"#,
        );
        let config = StrataConfig::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.experiment.steps, 25);
        assert_eq!(config.tournament.participants.len(), 2);
        assert_eq!(config.tournament.weights["bold"], 2.0);
        assert_eq!(config.scenarios.grid["drift"].len(), 2);
        assert_eq!(config.graph.layers.len(), 2);
        assert_eq!(config.graph.layers[1].streams[0].kind, "momentum");
        assert!(config.graph.layers[1].streams[0].params["price_key"].is_object());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let path = write_temp(
            "invalid",
            "experiment:\n  steps: 0\ntournament:\n  voting: plurality\n",
        );
        let err = StrataConfig::load_from_path(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Validation(_)));
        let message = err.to_string();
        assert!(message.contains("experiment.steps"), "{message}");
        assert!(message.contains("tournament.voting"), "{message}");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = StrataConfig::load_from_path("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn environment_override() {
        std::env::set_var("STRATA_EXPERIMENT__SEED", "7");
        let config = StrataConfig::load().unwrap();
        std::env::remove_var("STRATA_EXPERIMENT__SEED");
        assert_eq!(config.experiment.seed, 7);
    }
}
