//! Demo stream kinds and a ready-made two-layer market graph.

mod logistic;
mod momentum;
mod random_walk;

pub use logistic::LogisticPopulation;
pub use momentum::Momentum;
pub use random_walk::RandomWalk;

use strata_core::registry::StreamRegistry;
use strata_core::spec::{GraphSpec, LayerSpec, Param, StreamSpec};
use strata_core::stream::StreamKind;

/// Registers `random_walk`, `momentum` and `logistic_population`.
pub fn register_demo_streams(registry: &mut StreamRegistry) -> &mut StreamRegistry {
    registry
        .register::<RandomWalk>()
        .register::<Momentum>()
        .register::<LogisticPopulation>()
}

/// A registry holding only the demo kinds.
pub fn demo_registry() -> StreamRegistry {
    let mut registry = StreamRegistry::new();
    register_demo_streams(&mut registry);
    registry
}

/// Price feed in layer one, momentum policy reading it in layer two.
///
/// The policy's `price_key` is bound to the `price_key` bus entry so callers
/// can rewire it through context data; it defaults to the feed's own key.
pub fn market_graph(drift: f64, noise: f64, alpha: f64) -> GraphSpec {
    vec![
        LayerSpec::new(vec![StreamSpec::new("price", RandomWalk::KIND)
            .param("start", 100.0)
            .param("drift", drift)
            .param("noise", noise)]),
        LayerSpec::new(vec![StreamSpec::new("policy", Momentum::KIND)
            .param("alpha", alpha)
            .param("price_key", Param::from_data("price_key", "price.price"))]),
    ]
}
