//! ## strata-core::registry
//! **Stream constructors by kind name, and graph construction**
//!
//! ### Construction tiers:
//! 1. Strict: every supplied keyword is accepted by the kind and the
//!    constructor succeeds.
//! 2. Filtered: keywords the kind does not accept are dropped and the
//!    constructor is retried with the matching subset.
//! 3. Capture: a [`CaptureStream`] retains the resolved parameters verbatim.
//!
//! Tiers 2 and 3 log a warning. Only structural problems (unknown kind,
//! duplicate stream name within a layer) abort a build.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{BuildError, StreamError};
use crate::graph::{Graph, Layer};
use crate::spec::{LayerSpec, StreamSpec};
use crate::stream::{CaptureStream, Stream, StreamKind};
use crate::value::Params;

pub type Constructor =
    Arc<dyn Fn(&mut Context, &str, Params) -> Result<Box<dyn Stream>, StreamError> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    /// `None` accepts any keyword.
    accepted: Option<BTreeSet<String>>,
    construct: Constructor,
}

/// How a stream ended up being constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Construction {
    Strict,
    Filtered { dropped: Vec<String> },
    Captured { reason: String },
}

#[derive(Clone, Default)]
pub struct StreamRegistry {
    entries: HashMap<String, Entry>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed stream kind under [`StreamKind::KIND`].
    pub fn register<K: StreamKind>(&mut self) -> &mut Self {
        let construct: Constructor = Arc::new(|ctx, name, params| {
            let config: K::Config = config_from_params(params)?;
            let stream = K::build(ctx, name, config)?;
            Ok(Box::new(stream) as Box<dyn Stream>)
        });
        self.entries.insert(
            K::KIND.to_owned(),
            Entry {
                accepted: Some(K::PARAMS.iter().map(|p| p.to_string()).collect()),
                construct,
            },
        );
        self
    }

    /// Registers a closure constructor. An empty `accepted` list means the
    /// constructor takes any keyword.
    pub fn register_fn<F>(&mut self, kind: impl Into<String>, accepted: &[&str], f: F) -> &mut Self
    where
        F: Fn(&mut Context, &str, Params) -> Result<Box<dyn Stream>, StreamError>
            + Send
            + Sync
            + 'static,
    {
        let accepted = if accepted.is_empty() {
            None
        } else {
            Some(accepted.iter().map(|p| p.to_string()).collect())
        };
        self.entries.insert(
            kind.into(),
            Entry {
                accepted,
                construct: Arc::new(f),
            },
        );
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Resolves `spec`'s parameters and constructs the stream, applying the
    /// fallback tiers.
    pub fn instantiate(
        &self,
        ctx: &mut Context,
        spec: &StreamSpec,
    ) -> Result<(Box<dyn Stream>, Construction), BuildError> {
        let entry = self
            .entries
            .get(&spec.kind)
            .ok_or_else(|| BuildError::UnknownKind {
                stream: spec.name.clone(),
                kind: spec.kind.clone(),
            })?;
        let resolved = spec.resolve_params(ctx);

        let dropped: Vec<String> = match &entry.accepted {
            Some(accepted) => resolved
                .keys()
                .filter(|k| !accepted.contains(*k))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let failure = if dropped.is_empty() {
            match (entry.construct)(ctx, &spec.name, resolved.clone()) {
                Ok(stream) => return Ok((stream, Construction::Strict)),
                Err(e) => e,
            }
        } else {
            warn!(
                stream = %spec.name,
                kind = %spec.kind,
                dropped = ?dropped,
                "Stream kind does not accept all parameters, retrying with matching subset"
            );
            let filtered: Params = resolved
                .iter()
                .filter(|(k, _)| !dropped.contains(*k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            match (entry.construct)(ctx, &spec.name, filtered) {
                Ok(stream) => return Ok((stream, Construction::Filtered { dropped })),
                Err(e) => e,
            }
        };

        warn!(
            stream = %spec.name,
            kind = %spec.kind,
            error = %failure,
            "Stream construction failed, capturing parameters instead"
        );
        Ok((
            Box::new(CaptureStream::new(spec.name.clone(), resolved)),
            Construction::Captured {
                reason: failure.to_string(),
            },
        ))
    }

    /// Builds every layer in order; see [`build_graph`].
    pub fn build_graph(&self, spec: &[LayerSpec], ctx: &mut Context) -> Result<Graph, BuildError> {
        let mut layers = Vec::with_capacity(spec.len());
        for (index, layer_spec) in spec.iter().enumerate() {
            let mut names = HashSet::with_capacity(layer_spec.streams.len());
            let mut streams = Vec::with_capacity(layer_spec.streams.len());
            for stream_spec in &layer_spec.streams {
                if !names.insert(stream_spec.name.as_str()) {
                    return Err(BuildError::DuplicateStream {
                        layer: index,
                        stream: stream_spec.name.clone(),
                    });
                }
                let (stream, how) = self.instantiate(ctx, stream_spec)?;
                debug!(stream = %stream_spec.name, layer = index, construction = ?how, "Stream built");
                streams.push(stream);
            }
            layers.push(Layer::new(streams));
        }
        Ok(Graph::new(layers))
    }
}

impl fmt::Debug for StreamRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Instantiates every stream of every layer, in declared order, against `ctx`.
pub fn build_graph(
    registry: &StreamRegistry,
    spec: &[LayerSpec],
    ctx: &mut Context,
) -> Result<Graph, BuildError> {
    registry.build_graph(spec, ctx)
}

/// Deserialises a typed config struct from resolved keyword parameters.
pub fn config_from_params<T: serde::de::DeserializeOwned>(params: Params) -> Result<T, StreamError> {
    let json = serde_json::to_value(params).map_err(|e| StreamError::Config(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| StreamError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Param;
    use crate::value::{Metrics, Value};
    use serde::Deserialize;
    use tracing_test::traced_test;

    struct Gauge {
        name: String,
        level: f64,
        step_size: f64,
    }

    #[derive(Deserialize)]
    struct GaugeConfig {
        #[serde(default = "one")]
        start: f64,
        #[serde(default = "one")]
        step_size: f64,
    }

    fn one() -> f64 {
        1.0
    }

    impl Stream for Gauge {
        fn name(&self) -> &str {
            &self.name
        }

        fn step(&mut self, _ctx: &mut Context) -> Result<(), StreamError> {
            self.level += self.step_size;
            Ok(())
        }

        fn metrics_step(&self) -> Metrics {
            Metrics::from([("level".to_string(), Value::Float(self.level))])
        }
    }

    impl StreamKind for Gauge {
        const KIND: &'static str = "gauge";
        const PARAMS: &'static [&'static str] = &["start", "step_size"];
        type Config = GaugeConfig;

        fn build(_ctx: &mut Context, name: &str, config: GaugeConfig) -> Result<Self, StreamError> {
            if config.step_size < 0.0 {
                return Err(StreamError::Config("step_size must be non-negative".into()));
            }
            Ok(Gauge {
                name: name.to_owned(),
                level: config.start,
                step_size: config.step_size,
            })
        }
    }

    fn registry() -> StreamRegistry {
        let mut registry = StreamRegistry::new();
        registry.register::<Gauge>();
        registry
    }

    #[test]
    fn strict_construction() {
        let mut ctx = Context::new(0);
        let spec = StreamSpec::new("g", "gauge").param("start", 5.0);
        let (stream, how) = registry().instantiate(&mut ctx, &spec).unwrap();
        assert_eq!(how, Construction::Strict);
        assert_eq!(stream.metrics_step()["level"], Value::Float(5.0));
    }

    #[traced_test]
    #[test]
    fn unaccepted_keywords_are_filtered() {
        let mut ctx = Context::new(0);
        let spec = StreamSpec::new("g", "gauge")
            .param("start", 2.0)
            .param("colour", "blue");
        let (mut stream, how) = registry().instantiate(&mut ctx, &spec).unwrap();
        assert_eq!(
            how,
            Construction::Filtered {
                dropped: vec!["colour".into()]
            }
        );
        stream.step(&mut ctx).unwrap();
        assert_eq!(stream.metrics_step()["level"], Value::Float(3.0));
        assert!(logs_contain("retrying with matching subset"));
    }

    #[traced_test]
    #[test]
    fn unusable_config_is_captured() {
        let mut ctx = Context::new(0);
        let spec = StreamSpec::new("g", "gauge")
            .param("start", "not a number")
            .param("extra", 1);
        let (stream, how) = registry().instantiate(&mut ctx, &spec).unwrap();
        assert!(matches!(how, Construction::Captured { .. }));
        let captured = stream.captured().expect("capture stream");
        assert_eq!(captured["start"], Value::from("not a number"));
        assert_eq!(captured["extra"], Value::Int(1));
        assert!(logs_contain("capturing parameters instead"));
    }

    #[test]
    fn constructor_rejection_is_captured() {
        let mut ctx = Context::new(0);
        let spec = StreamSpec::new("g", "gauge").param("step_size", -1.0);
        let (_, how) = registry().instantiate(&mut ctx, &spec).unwrap();
        match how {
            Construction::Captured { reason } => assert!(reason.contains("non-negative")),
            other => panic!("expected capture, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let mut ctx = Context::new(0);
        let spec = vec![LayerSpec::new(vec![StreamSpec::new("x", "nope")])];
        let err = build_graph(&registry(), &spec, &mut ctx).unwrap_err();
        assert!(matches!(err, BuildError::UnknownKind { ref kind, .. } if kind == "nope"));
    }

    #[test]
    fn duplicate_names_in_a_layer_are_rejected() {
        let mut ctx = Context::new(0);
        let spec = vec![LayerSpec::new(vec![
            StreamSpec::new("g", "gauge"),
            StreamSpec::new("g", "gauge"),
        ])];
        let err = build_graph(&registry(), &spec, &mut ctx).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateStream { layer: 0, .. }));
    }

    #[test]
    fn bound_params_resolve_against_context() {
        let mut ctx = Context::new(0);
        ctx.data.insert("initial", 40.0);
        let spec = vec![
            LayerSpec::new(vec![StreamSpec::new("a", "gauge")
                .param("start", Param::from_data("initial", 0.0))]),
            LayerSpec::new(vec![StreamSpec::new("b", "gauge")
                .param("start", Param::from_data("missing", 7.0))]),
        ];
        let graph = build_graph(&registry(), &spec, &mut ctx).unwrap();
        let m = graph.metrics_step();
        assert_eq!(m["a.level"], Value::Float(40.0));
        assert_eq!(m["b.level"], Value::Float(7.0));
    }

    #[test]
    fn closure_kinds_accept_anything_when_unrestricted() {
        let mut registry = registry();
        registry.register_fn("echo", &[], |_ctx, name, params| {
            Ok(Box::new(CaptureStream::new(name, params)) as Box<dyn Stream>)
        });
        let mut ctx = Context::new(0);
        let spec = StreamSpec::new("e", "echo").param("anything", true);
        let (_, how) = registry.instantiate(&mut ctx, &spec).unwrap();
        assert_eq!(how, Construction::Strict);
        assert_eq!(registry.kinds(), vec!["echo", "gauge"]);
    }
}
