// Error types for the graph, execution and search boundaries.
//
// Only conditions that cross a boundary are errors here. A candidate move
// that turns out impossible is not an error at all; the graph just drops
// it. The three enums below are the recoverable and unrecoverable outcomes
// callers actually branch on:
//
// - `GraphError::OutOfLevel` is expected and frequent while the world
//   streams in. Searchers discard the partial expansion and retry later.
// - `ExecutionError::MissingItem` means the plan promised an item the
//   inventory does not have. Retrying cannot fix it, so it is fatal.
// - `SearchError` is what a `PathSearcher` reports to the controller.
//
// `RegistryError` and `ConfigError` live beside the data they validate
// (`block.rs`, `config.rs`).

use crate::types::Vec3i;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A block needed for the expansion is outside the loaded region.
    #[error("block at {pos} is outside the loaded level")]
    OutOfLevel { pos: Vec3i },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("{action} needs {wanted} but the inventory has none")]
    MissingItem { action: String, wanted: String },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("no route to the goal exists")]
    NoRoute,
    #[error("route search expired before reaching the goal")]
    Expired,
    #[error("route search was interrupted")]
    Interrupted,
    /// The start itself is outside the loaded region.
    #[error(transparent)]
    OutOfLevel(#[from] GraphError),
    #[error("route search failed: {0}")]
    Other(String),
}
