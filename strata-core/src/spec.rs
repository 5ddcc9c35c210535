//! Declarative graph blueprints.
//!
//! A [`StreamSpec`] names a registered stream kind and its keyword parameters.
//! Parameters may be late-bound: they are resolved against the episode
//! [`Context`] at construction time, which lets one stream's configuration
//! follow another stream's declared output key by convention.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::context::Context;
use crate::error::StreamError;
use crate::value::{Params, Value};

pub type ContextResolver = Arc<dyn Fn(&Context) -> Result<Value, StreamError> + Send + Sync>;
pub type LazyResolver = Arc<dyn Fn() -> Result<Value, StreamError> + Send + Sync>;

/// A keyword parameter, possibly resolved at construction time.
///
/// Every dynamic variant carries a `fallback` used when resolution fails, so
/// a bad binding never stops a graph from building.
#[derive(Clone)]
pub enum Param {
    Static(Value),
    /// Reads `key` from the data bus.
    FromData { key: String, fallback: Value },
    FromContext {
        resolve: ContextResolver,
        fallback: Value,
    },
    Lazy {
        resolve: LazyResolver,
        fallback: Value,
    },
}

impl Param {
    pub fn from_data(key: impl Into<String>, fallback: impl Into<Value>) -> Self {
        Param::FromData {
            key: key.into(),
            fallback: fallback.into(),
        }
    }

    pub fn from_context<F>(fallback: impl Into<Value>, resolve: F) -> Self
    where
        F: Fn(&Context) -> Result<Value, StreamError> + Send + Sync + 'static,
    {
        Param::FromContext {
            resolve: Arc::new(resolve),
            fallback: fallback.into(),
        }
    }

    pub fn lazy<F>(fallback: impl Into<Value>, resolve: F) -> Self
    where
        F: Fn() -> Result<Value, StreamError> + Send + Sync + 'static,
    {
        Param::Lazy {
            resolve: Arc::new(resolve),
            fallback: fallback.into(),
        }
    }

    /// Resolves against `ctx`, falling back instead of failing.
    pub fn resolve(&self, ctx: &Context) -> Value {
        match self {
            Param::Static(v) => v.clone(),
            Param::FromData { key, fallback } => match ctx.data.get(key) {
                Some(v) => v.clone(),
                None => {
                    debug!(key = %key, "Bound key not on data bus, using fallback");
                    fallback.clone()
                }
            },
            Param::FromContext { resolve, fallback } => resolve(ctx).unwrap_or_else(|e| {
                debug!(error = %e, "Context binding failed, using fallback");
                fallback.clone()
            }),
            Param::Lazy { resolve, fallback } => resolve().unwrap_or_else(|e| {
                debug!(error = %e, "Lazy binding failed, using fallback");
                fallback.clone()
            }),
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Param::FromData { key, fallback } => f
                .debug_struct("FromData")
                .field("key", key)
                .field("fallback", fallback)
                .finish(),
            Param::FromContext { fallback, .. } => f
                .debug_struct("FromContext")
                .field("fallback", fallback)
                .finish_non_exhaustive(),
            Param::Lazy { fallback, .. } => f
                .debug_struct("Lazy")
                .field("fallback", fallback)
                .finish_non_exhaustive(),
        }
    }
}

impl From<Value> for Param {
    fn from(v: Value) -> Self {
        Param::Static(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Static(v.into())
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Static(v.into())
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Static(v.into())
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Static(v.into())
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Static(v.into())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Static(v.into())
    }
}

/// Serialized form: a plain value, or `{ from_data: <key>, fallback: <value> }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParam {
    Bound {
        from_data: String,
        #[serde(default)]
        fallback: Value,
    },
    Static(Value),
}

impl<'de> Deserialize<'de> for Param {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawParam::deserialize(deserializer)? {
            RawParam::Bound {
                from_data,
                fallback,
            } => Param::FromData {
                key: from_data,
                fallback,
            },
            RawParam::Static(v) => Param::Static(v),
        })
    }
}

/// Blueprint for one stream instance.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSpec {
    pub name: String,
    /// Registry key of the stream constructor.
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, Param>,
}

impl StreamSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Param>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Resolves every parameter against `ctx`.
    pub fn resolve_params(&self, ctx: &Context) -> Params {
        self.params
            .iter()
            .map(|(k, p)| (k.clone(), p.resolve(ctx)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerSpec {
    pub streams: Vec<StreamSpec>,
}

impl LayerSpec {
    pub fn new(streams: Vec<StreamSpec>) -> Self {
        Self { streams }
    }
}

/// Layers in tick order.
pub type GraphSpec = Vec<LayerSpec>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_binding_uses_bus_value_or_fallback() {
        let mut ctx = Context::new(0);
        let p = Param::from_data("price.key", "price.price");
        assert_eq!(p.resolve(&ctx), Value::from("price.price"));
        ctx.data.insert("price.key", "feed.price");
        assert_eq!(p.resolve(&ctx), Value::from("feed.price"));
    }

    #[test]
    fn failing_resolvers_fall_back() {
        let ctx = Context::new(3);
        let by_ctx = Param::from_context(0.5, |_| Err(StreamError::Failed("nope".into())));
        assert_eq!(by_ctx.resolve(&ctx), Value::Float(0.5));

        let seeded = Param::from_context(0, |ctx| Ok(Value::from(ctx.seed * 10)));
        assert_eq!(seeded.resolve(&ctx), Value::Int(30));

        let lazy = Param::lazy(1, || Ok(Value::from("computed")));
        assert_eq!(lazy.resolve(&ctx), Value::from("computed"));
    }

    #[test]
    fn layer_specs_deserialize_with_bindings() {
        let json = r#"[
            {"streams": [{"name": "price", "kind": "random_walk", "params": {"drift": 0.1}}]},
            {"streams": [{"name": "policy", "kind": "momentum",
                          "params": {"price_key": {"from_data": "feed", "fallback": "price.price"}}}]}
        ]"#;
        let spec: GraphSpec = serde_json::from_str(json).expect("valid spec");
        assert_eq!(spec.len(), 2);
        assert!(matches!(
            spec[0].streams[0].params["drift"],
            Param::Static(Value::Float(_))
        ));
        match &spec[1].streams[0].params["price_key"] {
            Param::FromData { key, fallback } => {
                assert_eq!(key, "feed");
                assert_eq!(fallback, &Value::from("price.price"));
            }
            other => panic!("unexpected param {other:?}"),
        }
    }
}
