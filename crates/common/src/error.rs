use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A solver or executor setting was rejected at construction time.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Indicates an attempt to access a node index that exceeds the graph size (N).
    #[error("Node index {0} is out of bounds.")]
    NodeIndexOutOfBounds(usize),

    /// Indicates a structural inconsistency found during graph processing or validation.
    #[error("Graph structure is invalid or inconsistent.")]
    InvalidGraph,

    /// Failed to trace the full cycle path, usually due to a broken policy chain.
    #[error("Cycle path reconstruction failed due to broken policy chain.")]
    CycleReconstructionFailed,
}
