use thiserror::Error;

/// Failure raised by a stream, either while being constructed or while ticking.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Invalid stream configuration: {0}")]
    Config(String),

    #[error("Stream failure: {0}")]
    Failed(String),
}

/// Graph construction errors that the fallback tiers cannot absorb.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Stream '{stream}' uses unregistered kind '{kind}'")]
    UnknownKind { stream: String, kind: String },

    #[error("Duplicate stream name '{stream}' in layer {layer}")]
    DuplicateStream { layer: usize, stream: String },
}

/// A stream aborted the tick it was running in.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Stream '{stream}' failed at tick {tick}: {source}")]
    Stream {
        stream: String,
        tick: u64,
        #[source]
        source: StreamError,
    },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model construction failed: {0}")]
    Build(#[from] BuildError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Model failure: {0}")]
    Failed(String),
}
