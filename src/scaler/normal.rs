//! Linear scaling by the maximum magnitude.

use crate::scaler::Scaler;
use serde::{Deserialize, Serialize};

/// Divides by a fixed maximum: `x / max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalScaler {
    /// Maximum magnitude of the training data.
    pub max: f64,
}

impl NormalScaler {
    /// Creates a scaler from a precomputed maximum.
    pub fn new(max: f64) -> Self {
        Self { max }
    }
}

impl Scaler for NormalScaler {
    fn name(&self) -> &'static str {
        "normal"
    }

    #[inline]
    fn transform(&self, value: f64) -> f64 {
        value / self.max
    }

    #[inline]
    fn inverse_transform(&self, value: f64) -> f64 {
        value * self.max
    }
}
