//! Road-network graph: adjacency matrix, kernel weighting and edge sampling.

mod adjacency;
mod sampler;

pub use adjacency::{AdjacencyMatrix, NO_EDGE};
pub use sampler::{EdgeSample, EdgeSampler};
