//! ## strata-core::stream
//! **The pluggable unit of computation**
//!
//! A stream is ticked once per time step with mutable access to the episode
//! [`Context`]. It must tolerate absent upstream data on the bus and should
//! clamp domain states itself (floor a population at zero and so on); an
//! `Err` from `step` aborts the episode.

use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::StreamError;
use crate::value::{Metrics, Params};

pub trait Stream {
    /// Name, unique within the owning layer. Used as the metric namespace.
    fn name(&self) -> &str;

    fn step(&mut self, ctx: &mut Context) -> Result<(), StreamError>;

    fn metrics_step(&self) -> Metrics {
        Metrics::new()
    }

    fn metrics_episode(&self) -> Metrics {
        Metrics::new()
    }

    /// Parameters retained verbatim by a capture-only stream.
    fn captured(&self) -> Option<&Params> {
        None
    }
}

/// A statically typed stream kind that can be registered by type.
///
/// `PARAMS` lists every keyword the kind understands; keys outside it trigger
/// the filtered construction tier.
pub trait StreamKind: Stream + Sized + 'static {
    const KIND: &'static str;
    const PARAMS: &'static [&'static str];

    type Config: DeserializeOwned;

    fn build(ctx: &mut Context, name: &str, config: Self::Config) -> Result<Self, StreamError>;
}

/// Last-resort stream: does nothing and keeps its parameters for inspection.
#[derive(Debug, Clone)]
pub struct CaptureStream {
    name: String,
    params: Params,
}

impl CaptureStream {
    pub fn new(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl Stream for CaptureStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, _ctx: &mut Context) -> Result<(), StreamError> {
        Ok(())
    }

    fn captured(&self) -> Option<&Params> {
        Some(&self.params)
    }
}
