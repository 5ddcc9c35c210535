use serde::Deserialize;
use strata_core::context::Context;
use strata_core::error::StreamError;
use strata_core::stream::{Stream, StreamKind};
use strata_core::value::{Metrics, Value};

/// Position that follows price changes read from the bus.
///
/// When the price key is absent the last seen price is reused (0.0 before any
/// price was seen), so the stream tolerates being placed upstream of its feed.
#[derive(Debug)]
pub struct Momentum {
    name: String,
    alpha: f64,
    price_key: String,
    prev_price: Option<f64>,
    pos: f64,
    pnl: f64,
}

#[derive(Debug, Deserialize)]
pub struct MomentumConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_price_key")]
    pub price_key: String,
}

fn default_alpha() -> f64 {
    0.05
}
fn default_price_key() -> String {
    "price.price".into()
}

impl Stream for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, ctx: &mut Context) -> Result<(), StreamError> {
        let price = ctx
            .data
            .get_f64(&self.price_key)
            .or(self.prev_price)
            .unwrap_or(0.0);
        if let Some(prev) = self.prev_price {
            let signal = price - prev;
            self.pos += self.alpha * signal;
            self.pnl += self.pos * signal;
        }
        self.prev_price = Some(price);
        Ok(())
    }

    fn metrics_step(&self) -> Metrics {
        Metrics::from([
            ("pos".to_string(), Value::Float(self.pos)),
            ("pnl".to_string(), Value::Float(self.pnl)),
        ])
    }

    fn metrics_episode(&self) -> Metrics {
        Metrics::from([
            ("final_pos".to_string(), Value::Float(self.pos)),
            ("final_pnl".to_string(), Value::Float(self.pnl)),
        ])
    }
}

impl StreamKind for Momentum {
    const KIND: &'static str = "momentum";
    const PARAMS: &'static [&'static str] = &["alpha", "price_key"];
    type Config = MomentumConfig;

    fn build(_ctx: &mut Context, name: &str, config: MomentumConfig) -> Result<Self, StreamError> {
        Ok(Self {
            name: name.to_owned(),
            alpha: config.alpha,
            price_key: config.price_key,
            prev_price: None,
            pos: 0.0,
            pnl: 0.0,
        })
    }
}
