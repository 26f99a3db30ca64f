//! Batch iteration over prepared `(x, y)` arrays.

use crate::error::{Result, RoadcastError};
use ndarray::{Array4, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// One aligned batch of inputs and targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Inputs, shape `(batch, input_window, nodes, features)`.
    pub x: Array4<f64>,
    /// Targets, shape `(batch, output_window, nodes, features)`.
    pub y: Array4<f64>,
}

impl Batch {
    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.x.len_of(Axis(0))
    }

    /// Returns true if the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterates over aligned sample arrays in fixed-size batches.
///
/// The arrays are shared read-only. With `pad_with_last_sample`, the sample
/// list is extended by repeating the final sample until its length is a
/// multiple of the batch size, so every batch is full.
#[derive(Debug, Clone)]
pub struct DataLoader {
    x: Arc<Array4<f64>>,
    y: Arc<Array4<f64>>,
    batch_size: usize,
    pad_with_last_sample: bool,
    num_workers: usize,
    rng: Option<ChaCha8Rng>,
}

impl DataLoader {
    /// Creates a loader over `x` and `y`, which must have the same sample count.
    pub fn new(
        x: Array4<f64>,
        y: Array4<f64>,
        batch_size: usize,
        pad_with_last_sample: bool,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(RoadcastError::Configuration(
                "batch_size must be positive".to_string(),
            ));
        }
        if x.len_of(Axis(0)) != y.len_of(Axis(0)) {
            return Err(RoadcastError::ShapeMismatch(format!(
                "{} inputs but {} targets",
                x.len_of(Axis(0)),
                y.len_of(Axis(0))
            )));
        }
        Ok(Self {
            x: Arc::new(x),
            y: Arc::new(y),
            batch_size,
            pad_with_last_sample,
            num_workers: 1,
            rng: None,
        })
    }

    /// Shuffles sample order on every pass.
    pub fn with_shuffle(mut self, seed: Option<u64>) -> Self {
        self.rng = Some(match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        });
        self
    }

    /// Records the worker count for downstream consumers.
    pub fn with_num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    /// Number of real samples (without padding).
    pub fn num_samples(&self) -> usize {
        self.x.len_of(Axis(0))
    }

    /// Number of batches per pass.
    pub fn len(&self) -> usize {
        self.padded_len().div_ceil(self.batch_size)
    }

    /// Returns true if a pass yields no batches.
    pub fn is_empty(&self) -> bool {
        self.num_samples() == 0
    }

    /// Samples per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Worker count for downstream consumers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns true if the loader shuffles.
    pub fn shuffles(&self) -> bool {
        self.rng.is_some()
    }

    /// Shared input array.
    pub fn inputs(&self) -> &Arc<Array4<f64>> {
        &self.x
    }

    /// Shared target array.
    pub fn targets(&self) -> &Arc<Array4<f64>> {
        &self.y
    }

    fn padded_len(&self) -> usize {
        let n = self.num_samples();
        if self.pad_with_last_sample && n > 0 {
            n + (self.batch_size - n % self.batch_size) % self.batch_size
        } else {
            n
        }
    }

    /// Starts one pass over the data.
    pub fn iter(&mut self) -> Batches<'_> {
        let n = self.num_samples();
        let mut order: Vec<usize> = (0..n).collect();
        if n > 0 {
            order.resize(self.padded_len(), n - 1);
        }
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }
        Batches {
            loader: self,
            order,
            position: 0,
        }
    }
}

/// Iterator over the batches of one pass.
pub struct Batches<'a> {
    loader: &'a DataLoader,
    order: Vec<usize>,
    position: usize,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.position >= self.order.len() {
            return None;
        }
        let end = (self.position + self.loader.batch_size).min(self.order.len());
        let indices = &self.order[self.position..end];
        self.position = end;

        Some(Batch {
            x: self.loader.x.select(Axis(0), indices),
            y: self.loader.y.select(Axis(0), indices),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.position).div_ceil(self.loader.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}
