//! Dense adjacency matrix over the entity table.

use crate::error::{Result, RoadcastError};
use crate::table::{EntityTable, RelationTable};
use log::{debug, info};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Cell value for a pair with no known relation.
pub const NO_EDGE: f64 = f64::INFINITY;

/// Square weight matrix indexed by entity-table position.
///
/// Freshly built matrices hold raw relation weights with [`NO_EDGE`] in every
/// unassigned cell, so an unknown pair is distinguishable from a zero weight.
/// After [`gaussian_kernel`](Self::gaussian_kernel) missing pairs are `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyMatrix {
    weights: Array2<f64>,
}

impl AdjacencyMatrix {
    /// Creates an `n x n` matrix with no edges.
    pub fn empty(num_nodes: usize) -> Self {
        Self {
            weights: Array2::from_elem((num_nodes, num_nodes), NO_EDGE),
        }
    }

    /// Wraps an existing square weight matrix.
    pub fn from_weights(weights: Array2<f64>) -> Result<Self> {
        if weights.nrows() != weights.ncols() {
            return Err(RoadcastError::ShapeMismatch(format!(
                "adjacency matrix must be square, got {:?}",
                weights.shape()
            )));
        }
        Ok(Self { weights })
    }

    /// Populates a matrix from relation rows.
    ///
    /// Rows naming an identifier that is not in `entities` are skipped.
    /// A later row for the same pair overwrites an earlier one.
    pub fn from_relations(entities: &EntityTable, relations: &RelationTable) -> Self {
        let mut matrix = Self::empty(entities.len());
        let mut skipped = 0usize;

        for rel in &relations.relations {
            match (entities.index_of(&rel.origin), entities.index_of(&rel.destination)) {
                (Some(i), Some(j)) => matrix.weights[[i, j]] = rel.weight,
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {} relations referencing unknown entities", skipped);
        }
        matrix
    }

    /// Converts raw distances into Gaussian-kernel similarities.
    ///
    /// `w_ij = exp(-(d_ij / std)^2)`, where `std` is the population standard
    /// deviation of the finite cells. Missing cells map to `exp(-inf) = 0`.
    /// Weights below `epsilon` are zeroed. Returns a new matrix.
    pub fn gaussian_kernel(&self, epsilon: f64) -> Result<Self> {
        info!("Start Calculate the weight by Gauss kernel!");

        let finite: Vec<f64> = self.weights.iter().copied().filter(|w| w.is_finite()).collect();
        if finite.is_empty() {
            return Err(RoadcastError::Configuration(
                "cannot weight an adjacency matrix without finite distances".to_string(),
            ));
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let std = (finite.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n).sqrt();
        if std == 0.0 {
            return Err(RoadcastError::Configuration(
                "distances have zero spread; Gaussian weighting is undefined".to_string(),
            ));
        }

        let weights = self.weights.mapv(|d| {
            let w = (-(d / std).powi(2)).exp();
            if w < epsilon {
                0.0
            } else {
                w
            }
        });
        Ok(Self { weights })
    }

    /// The raw weight matrix.
    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Consumes the matrix and returns the weights.
    pub fn into_weights(self) -> Array2<f64> {
        self.weights
    }

    /// Number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.weights.nrows()
    }

    /// Weight of the `(i, j)` cell.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.weights.get([i, j]).copied()
    }

    /// Returns true if `(i, j)` holds a finite, non-zero weight.
    #[inline]
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.get(i, j).is_some_and(is_edge)
    }

    /// Number of cells holding a finite, non-zero weight.
    pub fn num_edges(&self) -> usize {
        self.weights.iter().filter(|&&w| is_edge(w)).count()
    }

    /// Iterates over `(i, j, weight)` for every edge in row-major order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.weights
            .indexed_iter()
            .filter(|(_, w)| is_edge(**w))
            .map(|((i, j), &w)| (i, j, w))
    }
}

#[inline]
fn is_edge(w: f64) -> bool {
    w.is_finite() && w != 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Relation;

    fn entities() -> EntityTable {
        EntityTable::new(vec!["a".into(), "b".into(), "c".into()]).unwrap()
    }

    fn relation(origin: &str, destination: &str, weight: f64) -> Relation {
        Relation {
            origin: origin.to_string(),
            destination: destination.to_string(),
            weight,
        }
    }

    #[test]
    fn test_unknown_entities_skipped() {
        let relations = RelationTable {
            weight_col: "cost".to_string(),
            relations: vec![
                relation("a", "b", 1.0),
                relation("a", "zzz", 2.0),
                relation("yyy", "c", 3.0),
                relation("c", "a", 4.0),
            ],
        };
        let adj = AdjacencyMatrix::from_relations(&entities(), &relations);

        assert_eq!(adj.num_nodes(), 3);
        assert_eq!(adj.get(0, 1), Some(1.0));
        assert_eq!(adj.get(2, 0), Some(4.0));
        assert_eq!(adj.get(0, 2), Some(NO_EDGE));
        assert_eq!(adj.num_edges(), 2);
    }

    #[test]
    fn test_gaussian_kernel_exp_minus_one() {
        // Finite distances {1, 3}: mean 2, population std 1.
        let mut weights = Array2::from_elem((3, 3), NO_EDGE);
        weights[[0, 1]] = 1.0;
        weights[[1, 2]] = 3.0;
        let adj = AdjacencyMatrix::from_weights(weights).unwrap();

        let unthresholded = adj.gaussian_kernel(0.0).unwrap();
        assert!((unthresholded.get(0, 1).unwrap() - (-1.0f64).exp()).abs() < 1e-12);
        assert!((unthresholded.get(0, 1).unwrap() - 0.3679).abs() < 1e-4);

        let weighted = adj.gaussian_kernel(0.1).unwrap();
        assert!((weighted.get(0, 1).unwrap() - 0.36787944).abs() < 1e-6);
        // exp(-9) is below the threshold.
        assert_eq!(weighted.get(1, 2), Some(0.0));
        // Missing edges become zero rather than the sentinel.
        assert_eq!(weighted.get(2, 0), Some(0.0));
        assert_eq!(weighted.num_edges(), 1);

        // The source matrix is untouched.
        assert_eq!(adj.get(2, 0), Some(NO_EDGE));
    }

    #[test]
    fn test_gaussian_kernel_requires_finite_cells() {
        let adj = AdjacencyMatrix::empty(2);
        assert!(matches!(
            adj.gaussian_kernel(0.1),
            Err(RoadcastError::Configuration(_))
        ));
    }

    #[test]
    fn test_non_square_rejected() {
        assert!(AdjacencyMatrix::from_weights(Array2::zeros((2, 3))).is_err());
    }

    #[test]
    fn test_edges_iterator() {
        let mut weights = Array2::zeros((2, 2));
        weights[[1, 0]] = 0.5;
        let adj = AdjacencyMatrix::from_weights(weights).unwrap();
        let edges: Vec<_> = adj.edges().collect();
        assert_eq!(edges, vec![(1, 0, 0.5)]);
        assert!(adj.has_edge(1, 0));
        assert!(!adj.has_edge(0, 1));
    }
}
