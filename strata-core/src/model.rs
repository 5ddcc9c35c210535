//! ## strata-core::model
//! **Uniform step / metrics contract over any simulation**
//!
//! [`Model`] is the seam the runner and the arena depend on. A
//! [`CompositeModel`] satisfies it with a layered graph; anything else that
//! can step and report metrics satisfies it just as well.

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::ModelError;
use crate::graph::Graph;
use crate::registry::StreamRegistry;
use crate::spec::GraphSpec;
use crate::value::{Metrics, Params, Value};

pub trait Model {
    /// Advances one tick.
    fn step(&mut self) -> Result<(), ModelError>;

    /// Metrics of the most recent tick.
    fn metrics_step(&self) -> Metrics;

    /// End-of-episode summary.
    fn metrics_episode(&mut self) -> Metrics;
}

/// Builds a fresh model for one episode.
///
/// The seed is passed explicitly so that every episode owns an independent,
/// reproducible random stream.
pub trait ModelFactory: Send + Sync {
    fn build(&self, seed: u64, params: &Params) -> Result<Box<dyn Model>, ModelError>;
}

impl<F> ModelFactory for F
where
    F: Fn(u64, &Params) -> Result<Box<dyn Model>, ModelError> + Send + Sync,
{
    fn build(&self, seed: u64, params: &Params) -> Result<Box<dyn Model>, ModelError> {
        self(seed, params)
    }
}

/// Post-processes a tick's graph metrics. May write to the context, e.g. to
/// republish a value under a key a downstream layer reads next tick.
pub type Aggregator = Arc<dyn Fn(&mut Context, Metrics) -> Metrics + Send + Sync>;

/// Adds the tick index as `t`.
pub fn default_aggregator() -> Aggregator {
    Arc::new(|ctx, mut metrics| {
        metrics.insert("t".to_string(), Value::from(ctx.t));
        metrics
    })
}

/// A graph plus its exclusively owned context.
pub struct CompositeModel {
    graph: Graph,
    ctx: Context,
    aggregator: Aggregator,
    last_step: Metrics,
    last_episode: Metrics,
}

impl CompositeModel {
    pub fn from_graph(graph: Graph, ctx: Context, aggregator: Option<Aggregator>) -> Self {
        Self {
            graph,
            ctx,
            aggregator: aggregator.unwrap_or_else(default_aggregator),
            last_step: Metrics::new(),
            last_episode: Metrics::new(),
        }
    }

    /// Creates a fresh context seeded with `seed` and pre-loaded with
    /// `ctx_data`, then builds the graph against it.
    pub fn from_spec(
        registry: &StreamRegistry,
        spec: &GraphSpec,
        seed: u64,
        aggregator: Option<Aggregator>,
        ctx_data: Params,
    ) -> Result<Self, ModelError> {
        let mut ctx = Context::with_data(seed, ctx_data);
        let graph = registry.build_graph(spec, &mut ctx)?;
        Ok(Self::from_graph(graph, ctx, aggregator))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl Model for CompositeModel {
    fn step(&mut self) -> Result<(), ModelError> {
        self.graph.step(&mut self.ctx)?;
        let raw = self.graph.metrics_step();
        self.last_step = (self.aggregator)(&mut self.ctx, raw);
        Ok(())
    }

    fn metrics_step(&self) -> Metrics {
        self.last_step.clone()
    }

    fn metrics_episode(&mut self) -> Metrics {
        let mut merged = self.graph.metrics_episode();
        merged.extend(self.ctx.episode.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.last_episode = merged;
        self.last_episode.clone()
    }
}

impl fmt::Debug for CompositeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeModel")
            .field("graph", &self.graph)
            .field("t", &self.ctx.t)
            .finish_non_exhaustive()
    }
}

/// Factory that builds a [`CompositeModel`] from a declarative graph.
///
/// Per-episode parameters override `ctx_data` and are placed on the data bus
/// before any stream is constructed, so bound parameters can read them.
#[derive(Clone)]
pub struct SpecModelFactory {
    registry: Arc<StreamRegistry>,
    spec: GraphSpec,
    aggregator: Option<Aggregator>,
    ctx_data: Params,
}

impl SpecModelFactory {
    pub fn new(registry: Arc<StreamRegistry>, spec: GraphSpec) -> Self {
        Self {
            registry,
            spec,
            aggregator: None,
            ctx_data: Params::new(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    pub fn with_ctx_data(mut self, data: Params) -> Self {
        self.ctx_data = data;
        self
    }

    pub fn spec(&self) -> &GraphSpec {
        &self.spec
    }
}

impl ModelFactory for SpecModelFactory {
    fn build(&self, seed: u64, params: &Params) -> Result<Box<dyn Model>, ModelError> {
        let mut data = self.ctx_data.clone();
        data.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        let model = CompositeModel::from_spec(
            &self.registry,
            &self.spec,
            seed,
            self.aggregator.clone(),
            data,
        )?;
        Ok(Box::new(model))
    }
}

impl fmt::Debug for SpecModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecModelFactory")
            .field("registry", &self.registry)
            .field("spec", &self.spec)
            .field("ctx_data", &self.ctx_data)
            .finish_non_exhaustive()
    }
}
