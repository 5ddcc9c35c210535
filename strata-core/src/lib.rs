//! # strata-core
//!
//! Layered, tick-driven stream graphs over a shared per-episode context.
//!
//! ### Execution model:
//! - One [`Context`] per episode owns the clock, the seeded RNG and the data bus
//! - A [`Graph`] ticks its layers in order, and each layer ticks its streams in order
//! - Streams communicate only through the data bus by naming convention
//!
//! ### Key Submodules:
//! - `spec`: declarative blueprints with late-bound parameters
//! - `registry`: kind-name constructors and fallback-tolerant graph building
//! - `model`: the step / metrics contract consumed by runners

pub mod context;
pub mod error;
pub mod graph;
pub mod model;
pub mod registry;
pub mod spec;
pub mod stream;
pub mod value;

pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::*;
    pub use crate::graph::{Graph, Layer};
    pub use crate::model::*;
    pub use crate::registry::{build_graph, Construction, StreamRegistry};
    pub use crate::spec::*;
    pub use crate::stream::*;
    pub use crate::value::*;
}

pub use context::Context;
pub use error::{BuildError, GraphError, ModelError, StreamError};
pub use graph::{Graph, Layer};
pub use model::{CompositeModel, Model, ModelFactory, SpecModelFactory};
pub use registry::{build_graph, StreamRegistry};
