//! Standardization to zero mean and unit variance.

use crate::scaler::Scaler;
use serde::{Deserialize, Serialize};

/// `(x - mean) / std`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of the training inputs.
    pub mean: f64,
    /// Population standard deviation of the training inputs.
    pub std: f64,
}

impl StandardScaler {
    /// Creates a scaler from precomputed statistics.
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }
}

impl Scaler for StandardScaler {
    fn name(&self) -> &'static str {
        "standard"
    }

    #[inline]
    fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    #[inline]
    fn inverse_transform(&self, value: f64) -> f64 {
        value * self.std + self.mean
    }
}
