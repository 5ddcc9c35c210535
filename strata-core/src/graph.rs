//! ## strata-core::graph
//! **Layered, strictly sequential tick execution**
//!
//! ### Ordering contract:
//! - The context clock advances exactly once per [`Graph::step`], before any layer runs
//! - Layers run in declared order; streams within a layer run in declared order
//! - A stream sees everything earlier layers published during the same tick
//!
//! Metric extraction flattens child maps into one map keyed `<stream>.<key>`.
//! Later entries win on collision; that is not an error.

use std::fmt;

use tracing::trace;

use crate::context::Context;
use crate::error::GraphError;
use crate::stream::Stream;
use crate::value::{namespaced, Metrics};

/// An ordered group of streams ticked together within one time step.
pub struct Layer {
    streams: Vec<Box<dyn Stream>>,
}

impl Layer {
    pub fn new(streams: Vec<Box<dyn Stream>>) -> Self {
        Self { streams }
    }

    pub fn step(&mut self, ctx: &mut Context) -> Result<(), GraphError> {
        for stream in &mut self.streams {
            trace!(stream = stream.name(), tick = ctx.t, "Ticking stream");
            stream.step(ctx).map_err(|source| GraphError::Stream {
                stream: stream.name().to_owned(),
                tick: ctx.t,
                source,
            })?;
        }
        Ok(())
    }

    pub fn metrics_step(&self) -> Metrics {
        self.collect(|s| s.metrics_step())
    }

    pub fn metrics_episode(&self) -> Metrics {
        self.collect(|s| s.metrics_episode())
    }

    fn collect(&self, extract: impl Fn(&dyn Stream) -> Metrics) -> Metrics {
        let mut out = Metrics::new();
        for stream in &self.streams {
            for (key, value) in extract(stream.as_ref()) {
                out.insert(namespaced(stream.name(), &key), value);
            }
        }
        out
    }

    pub fn streams(&self) -> impl Iterator<Item = &dyn Stream> {
        self.streams.iter().map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.streams.iter().map(|s| s.name()))
            .finish()
    }
}

/// An ordered sequence of layers forming one full model.
#[derive(Debug)]
pub struct Graph {
    layers: Vec<Layer>,
}

impl Graph {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    /// Advances the clock once, then ticks every layer in order.
    pub fn step(&mut self, ctx: &mut Context) -> Result<(), GraphError> {
        ctx.step_tick();
        for layer in &mut self.layers {
            layer.step(ctx)?;
        }
        Ok(())
    }

    pub fn metrics_step(&self) -> Metrics {
        let mut out = Metrics::new();
        for layer in &self.layers {
            out.extend(layer.metrics_step());
        }
        out
    }

    pub fn metrics_episode(&self) -> Metrics {
        let mut out = Metrics::new();
        for layer in &self.layers {
            out.extend(layer.metrics_episode());
        }
        out
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Looks a stream up by name across all layers.
    pub fn stream(&self, name: &str) -> Option<&dyn Stream> {
        self.layers
            .iter()
            .flat_map(|layer| layer.streams())
            .find(|s| s.name() == name)
    }
}
