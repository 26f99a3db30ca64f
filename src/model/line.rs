//! LINE: large-scale information network embedding.
//!
//! First-order proximity scores a pair with one shared table, `<e_i, e_j>`.
//! Second-order proximity scores node `i` against the context vector of
//! node `j`, `<s_i, c_j>`. Both train on labelled pairs with the objective
//! `mean(-log sigmoid(label * score))`.

use crate::config::EmbeddingConfig;
use crate::error::{Result, RoadcastError};
use crate::graph::EdgeSample;
use log::info;
use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Proximity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineOrder {
    /// Shared node table.
    First,
    /// Separate node and context tables.
    Second,
}

impl FromStr for LineOrder {
    type Err = RoadcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first" => Ok(LineOrder::First),
            "second" => Ok(LineOrder::Second),
            other => Err(RoadcastError::Configuration(format!(
                "order must be `first` or `second`, got `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for LineOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineOrder::First => f.write_str("first"),
            LineOrder::Second => f.write_str("second"),
        }
    }
}

/// Embedding tables, one shape per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum LineTables {
    /// First order: `score(i, j) = <node_i, node_j>`.
    Symmetric {
        /// Node embeddings, shape `(num_nodes, embedding_size)`.
        node: Array2<f64>,
    },
    /// Second order: `score(i, j) = <node_i, context_j>`.
    Asymmetric {
        /// Node embeddings, shape `(num_nodes, embedding_size)`.
        node: Array2<f64>,
        /// Context embeddings, same shape as `node`.
        context: Array2<f64>,
    },
}

/// LINE edge scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    tables: LineTables,
}

impl Line {
    /// Creates a model for `num_nodes` nodes with N(0, 1) initialized tables.
    pub fn new(config: &EmbeddingConfig, num_nodes: usize) -> Result<Self> {
        let order: LineOrder = config.order.parse()?;
        if num_nodes == 0 || config.embedding_size == 0 {
            return Err(RoadcastError::Configuration(format!(
                "cannot embed {} nodes in {} dimensions",
                num_nodes, config.embedding_size
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let normal =
            Normal::new(0.0, 1.0).map_err(|e| RoadcastError::Configuration(e.to_string()))?;
        let shape = (num_nodes, config.embedding_size);

        let node = random_table(shape, &normal, &mut rng);
        let tables = match order {
            LineOrder::First => LineTables::Symmetric { node },
            LineOrder::Second => LineTables::Asymmetric {
                node,
                context: random_table(shape, &normal, &mut rng),
            },
        };

        info!(
            "LINE ({} order): {} nodes x {} dims",
            order, num_nodes, config.embedding_size
        );
        Ok(Self { tables })
    }

    /// First-order model over a given node table.
    pub fn from_node_table(node: Array2<f64>) -> Self {
        Self {
            tables: LineTables::Symmetric { node },
        }
    }

    /// Second-order model over given node and context tables.
    pub fn from_tables(node: Array2<f64>, context: Array2<f64>) -> Result<Self> {
        if node.dim() != context.dim() {
            return Err(RoadcastError::ShapeMismatch(format!(
                "node table {:?} vs context table {:?}",
                node.shape(),
                context.shape()
            )));
        }
        Ok(Self {
            tables: LineTables::Asymmetric { node, context },
        })
    }

    /// Proximity order of this model.
    pub fn order(&self) -> LineOrder {
        match self.tables {
            LineTables::Symmetric { .. } => LineOrder::First,
            LineTables::Asymmetric { .. } => LineOrder::Second,
        }
    }

    /// Embedding tables.
    pub fn tables(&self) -> &LineTables {
        &self.tables
    }

    /// Node embedding table.
    pub fn node_embeddings(&self) -> &Array2<f64> {
        match &self.tables {
            LineTables::Symmetric { node } | LineTables::Asymmetric { node, .. } => node,
        }
    }

    /// Context embedding table (second order only).
    pub fn context_embeddings(&self) -> Option<&Array2<f64>> {
        match &self.tables {
            LineTables::Symmetric { .. } => None,
            LineTables::Asymmetric { context, .. } => Some(context),
        }
    }

    /// Number of embedded nodes.
    pub fn num_nodes(&self) -> usize {
        self.node_embeddings().nrows()
    }

    /// Embedding vector length.
    pub fn embedding_size(&self) -> usize {
        self.node_embeddings().ncols()
    }

    /// Embedding of node `i`.
    pub fn embedding(&self, i: usize) -> Result<ArrayView1<'_, f64>> {
        row(self.node_embeddings(), i)
    }

    /// Score of the ordered pair `(i, j)`.
    pub fn score(&self, i: usize, j: usize) -> Result<f64> {
        let target = match &self.tables {
            LineTables::Symmetric { node } => node,
            LineTables::Asymmetric { context, .. } => context,
        };
        Ok(self.embedding(i)?.dot(&row(target, j)?))
    }

    /// Scores aligned index lists pairwise.
    pub fn forward(&self, i: &[usize], j: &[usize]) -> Result<Array1<f64>> {
        if i.len() != j.len() {
            return Err(RoadcastError::ShapeMismatch(format!(
                "{} sources but {} targets",
                i.len(),
                j.len()
            )));
        }
        i.iter()
            .zip(j)
            .map(|(&a, &b)| self.score(a, b))
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from)
    }

    /// Mean of `-log sigmoid(label * score)` over the batch.
    pub fn calculate_loss(&self, batch: &[EdgeSample]) -> Result<f64> {
        if batch.is_empty() {
            return Err(RoadcastError::EmptyInput("empty edge batch".to_string()));
        }
        let mut total = 0.0;
        for sample in batch {
            total -= log_sigmoid(sample.label * self.score(sample.i, sample.j)?);
        }
        Ok(total / batch.len() as f64)
    }
}

fn random_table<R: Rng>(shape: (usize, usize), normal: &Normal<f64>, rng: &mut R) -> Array2<f64> {
    Array2::from_shape_fn(shape, |_| normal.sample(rng))
}

fn row(table: &Array2<f64>, index: usize) -> Result<ArrayView1<'_, f64>> {
    if index >= table.nrows() {
        return Err(RoadcastError::IndexOutOfBounds {
            index,
            max: table.nrows(),
        });
    }
    Ok(table.row(index))
}

/// `log(sigmoid(x))` without overflow for large `|x|`.
#[inline]
fn log_sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        -(-x).exp().ln_1p()
    } else {
        x - x.exp().ln_1p()
    }
}
