//! Identity scaler.

use crate::scaler::Scaler;

/// Leaves values unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneScaler;

impl Scaler for NoneScaler {
    fn name(&self) -> &'static str {
        "none"
    }

    #[inline]
    fn transform(&self, value: f64) -> f64 {
        value
    }

    #[inline]
    fn inverse_transform(&self, value: f64) -> f64 {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(NoneScaler.transform(42.5), 42.5);
        assert_eq!(NoneScaler.inverse_transform(-3.0), -3.0);
    }
}
