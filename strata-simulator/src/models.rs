//! Stand-alone demo model implementing [`Model`] without a stream graph.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use strata_core::error::ModelError;
use strata_core::model::Model;
use strata_core::value::{Metrics, Params, Value};

/// A scalar that drifts by a constant plus gaussian noise each tick.
#[derive(Debug)]
pub struct DriftModel {
    x: f64,
    drift: f64,
    t: u64,
    noise: Normal<f64>,
    rng: StdRng,
}

impl DriftModel {
    pub fn new(start: f64, drift: f64, noise: f64, seed: u64) -> Result<Self, ModelError> {
        if noise.is_nan() || noise < 0.0 {
            return Err(ModelError::Failed(format!(
                "noise must be a non-negative standard deviation, got {noise}"
            )));
        }
        let noise = Normal::new(0.0, noise).map_err(|e| ModelError::Failed(e.to_string()))?;
        Ok(Self {
            x: start,
            drift,
            t: 0,
            noise,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl Model for DriftModel {
    fn step(&mut self) -> Result<(), ModelError> {
        self.t += 1;
        self.x += self.drift + self.rng.sample(self.noise);
        Ok(())
    }

    fn metrics_step(&self) -> Metrics {
        Metrics::from([
            ("t".to_string(), Value::from(self.t)),
            ("x".to_string(), Value::Float(self.x)),
        ])
    }

    fn metrics_episode(&mut self) -> Metrics {
        Metrics::from([("final_abs_x".to_string(), Value::Float(self.x.abs()))])
    }
}

fn param_f64(params: &Params, key: &str, default: f64) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(default)
}

/// Builds a [`DriftModel`] from `start`, `drift` and `noise`, defaulting to
/// 1.0, 0.05 and 0.01.
pub fn drift_factory(seed: u64, params: &Params) -> Result<Box<dyn Model>, ModelError> {
    let model = DriftModel::new(
        param_f64(params, "start", 1.0),
        param_f64(params, "drift", 0.05),
        param_f64(params, "noise", 0.01),
        seed,
    )?;
    Ok(Box::new(model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noiseless_drift_is_linear() {
        let mut model = DriftModel::new(2.0, 0.5, 0.0, 0).unwrap();
        for _ in 0..4 {
            model.step().unwrap();
        }
        assert_eq!(model.metrics_step()["x"], Value::Float(4.0));
        assert_eq!(model.metrics_episode()["final_abs_x"], Value::Float(4.0));
    }

    #[test]
    fn negative_noise_is_rejected() {
        assert!(matches!(
            DriftModel::new(0.0, 0.0, -1.0, 0),
            Err(ModelError::Failed(_))
        ));
        assert!(DriftModel::new(0.0, 0.0, f64::NAN, 0).is_err());
        assert!(DriftModel::new(0.0, 0.0, 0.0, 0).is_ok());
    }
}
