use rand::Rng;
use rand_distr::Normal;
use serde::Deserialize;
use strata_core::context::Context;
use strata_core::error::StreamError;
use strata_core::stream::{Stream, StreamKind};
use strata_core::value::{namespaced, Metrics, Value};

/// Price following a drift plus gaussian noise drawn from the episode RNG.
/// Publishes `<name>.price` every tick.
#[derive(Debug)]
pub struct RandomWalk {
    name: String,
    key: String,
    price: f64,
    drift: f64,
    noise: Normal<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RandomWalkConfig {
    #[serde(default = "default_start")]
    pub start: f64,
    #[serde(default = "default_drift")]
    pub drift: f64,
    #[serde(default = "default_noise")]
    pub noise: f64,
}

fn default_start() -> f64 {
    100.0
}
fn default_drift() -> f64 {
    0.05
}
fn default_noise() -> f64 {
    0.1
}

impl Stream for RandomWalk {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, ctx: &mut Context) -> Result<(), StreamError> {
        self.price += self.drift + ctx.rng.sample(self.noise);
        ctx.data.insert(self.key.clone(), self.price);
        Ok(())
    }

    fn metrics_step(&self) -> Metrics {
        Metrics::from([("price".to_string(), Value::Float(self.price))])
    }

    fn metrics_episode(&self) -> Metrics {
        Metrics::from([("final_price".to_string(), Value::Float(self.price))])
    }
}

impl StreamKind for RandomWalk {
    const KIND: &'static str = "random_walk";
    const PARAMS: &'static [&'static str] = &["start", "drift", "noise"];
    type Config = RandomWalkConfig;

    fn build(_ctx: &mut Context, name: &str, config: RandomWalkConfig) -> Result<Self, StreamError> {
        if config.noise.is_nan() || config.noise < 0.0 {
            return Err(StreamError::Config(format!(
                "noise must be a non-negative standard deviation, got {}",
                config.noise
            )));
        }
        let noise =
            Normal::new(0.0, config.noise).map_err(|e| StreamError::Config(e.to_string()))?;
        Ok(Self {
            name: name.to_owned(),
            key: namespaced(name, "price"),
            price: config.start,
            drift: config.drift,
            noise,
        })
    }
}
