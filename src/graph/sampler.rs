//! Positive/negative edge sampling for graph-embedding objectives.

use crate::error::{Result, RoadcastError};
use crate::graph::AdjacencyMatrix;
use log::info;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A labelled node pair: `+1.0` for an observed edge, `-1.0` for a sampled non-edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSample {
    /// Source node index.
    pub i: usize,
    /// Target node index.
    pub j: usize,
    /// Edge label, `+1.0` or `-1.0`.
    pub label: f64,
}

impl EdgeSample {
    /// A true edge.
    pub fn positive(i: usize, j: usize) -> Self {
        Self { i, j, label: 1.0 }
    }

    /// A sampled non-edge.
    pub fn negative(i: usize, j: usize) -> Self {
        Self { i, j, label: -1.0 }
    }
}

/// Draws positive edges from an adjacency matrix and uniform negatives.
pub struct EdgeSampler {
    negative_ratio: usize,
    rng: ChaCha8Rng,
}

impl EdgeSampler {
    /// Creates a sampler drawing `negative_ratio` negatives per positive edge.
    pub fn new(negative_ratio: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { negative_ratio, rng }
    }

    /// Produces every non-diagonal edge as a positive, each followed by its negatives.
    ///
    /// A negative for `(i, j)` pairs `i` with a node `k != i` that is not an
    /// edge target of `i`. Rows with no such node contribute no negatives.
    pub fn sample(&mut self, adjacency: &AdjacencyMatrix) -> Result<Vec<EdgeSample>> {
        let num_nodes = adjacency.num_nodes();
        let positives: Vec<(usize, usize)> = adjacency
            .edges()
            .filter(|(i, j, _)| i != j)
            .map(|(i, j, _)| (i, j))
            .collect();

        if positives.is_empty() {
            return Err(RoadcastError::EmptyInput(
                "adjacency matrix has no edges to sample".to_string(),
            ));
        }

        let mut non_targets: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
        for (i, candidates) in non_targets.iter_mut().enumerate() {
            candidates.extend((0..num_nodes).filter(|&k| k != i && !adjacency.has_edge(i, k)));
        }

        let mut samples = Vec::with_capacity(positives.len() * (1 + self.negative_ratio));
        for (i, j) in positives {
            samples.push(EdgeSample::positive(i, j));
            for _ in 0..self.negative_ratio {
                if let Some(&k) = non_targets[i].choose(&mut self.rng) {
                    samples.push(EdgeSample::negative(i, k));
                }
            }
        }

        info!(
            "Sampled {} edge pairs ({} negatives per edge)",
            samples.len(),
            self.negative_ratio
        );
        Ok(samples)
    }
}
