use serde::Deserialize;
use strata_core::context::Context;
use strata_core::error::StreamError;
use strata_core::stream::{Stream, StreamKind};
use strata_core::value::{namespaced, Metrics, Value};

/// Logistic growth with an optional harvest read from the bus.
///
/// The population is floored at zero instead of failing the tick.
#[derive(Debug)]
pub struct LogisticPopulation {
    name: String,
    key: String,
    population: f64,
    peak: f64,
    growth_rate: f64,
    capacity: f64,
    harvest_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogisticConfig {
    #[serde(default = "default_initial")]
    pub initial: f64,
    #[serde(default = "default_growth_rate")]
    pub growth_rate: f64,
    #[serde(default = "default_capacity")]
    pub capacity: f64,
    #[serde(default)]
    pub harvest_key: Option<String>,
}

fn default_initial() -> f64 {
    10.0
}
fn default_growth_rate() -> f64 {
    0.3
}
fn default_capacity() -> f64 {
    1000.0
}

impl Stream for LogisticPopulation {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, ctx: &mut Context) -> Result<(), StreamError> {
        let harvest = self
            .harvest_key
            .as_deref()
            .and_then(|key| ctx.data.get_f64(key))
            .unwrap_or(0.0);
        let n = self.population;
        let next = n + self.growth_rate * n * (1.0 - n / self.capacity) - harvest;
        self.population = next.max(0.0);
        self.peak = self.peak.max(self.population);
        ctx.data.insert(self.key.clone(), self.population);
        Ok(())
    }

    fn metrics_step(&self) -> Metrics {
        Metrics::from([("population".to_string(), Value::Float(self.population))])
    }

    fn metrics_episode(&self) -> Metrics {
        Metrics::from([
            ("final_population".to_string(), Value::Float(self.population)),
            ("peak_population".to_string(), Value::Float(self.peak)),
        ])
    }
}

impl StreamKind for LogisticPopulation {
    const KIND: &'static str = "logistic_population";
    const PARAMS: &'static [&'static str] = &["initial", "growth_rate", "capacity", "harvest_key"];
    type Config = LogisticConfig;

    fn build(_ctx: &mut Context, name: &str, config: LogisticConfig) -> Result<Self, StreamError> {
        if config.capacity.is_nan() || config.capacity <= 0.0 {
            return Err(StreamError::Config("capacity must be positive".into()));
        }
        let initial = config.initial.max(0.0);
        Ok(Self {
            name: name.to_owned(),
            key: namespaced(name, "population"),
            population: initial,
            peak: initial,
            growth_rate: config.growth_rate,
            capacity: config.capacity,
            harvest_key: config.harvest_key,
        })
    }
}
