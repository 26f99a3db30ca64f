//! Min-max rescaling to `[0, 1]` or `[-1, 1]`.

use crate::scaler::Scaler;
use serde::{Deserialize, Serialize};

/// `(x - min) / (max - min)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax01Scaler {
    /// Training minimum.
    pub min: f64,
    /// Training maximum.
    pub max: f64,
}

impl MinMax01Scaler {
    /// Creates a scaler from precomputed bounds.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Scaler for MinMax01Scaler {
    fn name(&self) -> &'static str {
        "minmax01"
    }

    #[inline]
    fn transform(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }

    #[inline]
    fn inverse_transform(&self, value: f64) -> f64 {
        value * (self.max - self.min) + self.min
    }
}

/// `2 (x - min) / (max - min) - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMax11Scaler {
    /// Training minimum.
    pub min: f64,
    /// Training maximum.
    pub max: f64,
}

impl MinMax11Scaler {
    /// Creates a scaler from precomputed bounds.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Scaler for MinMax11Scaler {
    fn name(&self) -> &'static str {
        "minmax11"
    }

    #[inline]
    fn transform(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min) * 2.0 - 1.0
    }

    #[inline]
    fn inverse_transform(&self, value: f64) -> f64 {
        (value + 1.0) / 2.0 * (self.max - self.min) + self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax01_bounds() {
        let scaler = MinMax01Scaler::new(20.0, 70.0);
        assert_eq!(scaler.transform(20.0), 0.0);
        assert_eq!(scaler.transform(70.0), 1.0);
        assert!((scaler.inverse_transform(0.5) - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_minmax11_bounds() {
        let scaler = MinMax11Scaler::new(20.0, 70.0);
        assert_eq!(scaler.transform(20.0), -1.0);
        assert_eq!(scaler.transform(70.0), 1.0);
        assert!(scaler.transform(45.0).abs() < 1e-12);
        assert!((scaler.inverse_transform(0.0) - 45.0).abs() < 1e-12);
    }
}
