//! Invertible normalization strategies.
//!
//! Every scaler is element-wise and built from precomputed statistics.
//! [`ScalerKind::fit`] computes those statistics from the training partition,
//! restricted to the first `output_dim` channels; trailing temporal channels
//! are never scaled.

mod minmax;
mod none;
mod normal;
mod standard;

pub use minmax::{MinMax01Scaler, MinMax11Scaler};
pub use none::NoneScaler;
pub use normal::NormalScaler;
pub use standard::StandardScaler;

use crate::error::{Result, RoadcastError};
use log::{info, warn};
use ndarray::{s, Array4, ArrayView4, ArrayViewMutD};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Trait for invertible element-wise normalization.
pub trait Scaler: fmt::Debug + Send + Sync {
    /// Short name of the strategy.
    fn name(&self) -> &'static str;

    /// Normalizes one value.
    fn transform(&self, value: f64) -> f64;

    /// Restores one normalized value.
    fn inverse_transform(&self, value: f64) -> f64;

    /// Normalizes every element in place.
    fn transform_in_place(&self, mut data: ArrayViewMutD<'_, f64>) {
        data.mapv_inplace(|v| self.transform(v));
    }

    /// Restores every element in place.
    fn inverse_transform_in_place(&self, mut data: ArrayViewMutD<'_, f64>) {
        data.mapv_inplace(|v| self.inverse_transform(v));
    }
}

/// Normalizes the first `output_dim` channels of a `(sample, step, node, feature)` array.
pub fn scale_channels(scaler: &dyn Scaler, data: &mut Array4<f64>, output_dim: usize) {
    scaler.transform_in_place(data.slice_mut(s![.., .., .., ..output_dim]).into_dyn());
}

/// Restores the first `output_dim` channels of a `(sample, step, node, feature)` array.
pub fn unscale_channels(scaler: &dyn Scaler, data: &mut Array4<f64>, output_dim: usize) {
    scaler.inverse_transform_in_place(data.slice_mut(s![.., .., .., ..output_dim]).into_dyn());
}

/// Scaler selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalerKind {
    /// Identity.
    None,
    /// Divide by the maximum magnitude.
    Normal,
    /// Zero mean, unit variance.
    Standard,
    /// Min-max to `[0, 1]`.
    MinMax01,
    /// Min-max to `[-1, 1]`.
    MinMax11,
}

impl FromStr for ScalerKind {
    type Err = RoadcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(ScalerKind::None),
            "normal" => Ok(ScalerKind::Normal),
            "standard" => Ok(ScalerKind::Standard),
            "minmax01" => Ok(ScalerKind::MinMax01),
            "minmax11" => Ok(ScalerKind::MinMax11),
            other => Err(RoadcastError::Configuration(format!(
                "unknown scaler type `{}`",
                other
            ))),
        }
    }
}

impl fmt::Display for ScalerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalerKind::None => "none",
            ScalerKind::Normal => "normal",
            ScalerKind::Standard => "standard",
            ScalerKind::MinMax01 => "minmax01",
            ScalerKind::MinMax11 => "minmax11",
        };
        f.write_str(name)
    }
}

impl ScalerKind {
    /// Fits a scaler on the training partition.
    ///
    /// Only channels `..output_dim` are inspected. The standard scaler uses
    /// `x_train`; the max and min-max scalers use `x_train` and `y_train`.
    pub fn fit(
        &self,
        x_train: ArrayView4<'_, f64>,
        y_train: ArrayView4<'_, f64>,
        output_dim: usize,
    ) -> Result<Arc<dyn Scaler>> {
        let x = x_train.slice(s![.., .., .., ..output_dim]);
        let y = y_train.slice(s![.., .., .., ..output_dim]);
        if *self != ScalerKind::None && x.is_empty() {
            return Err(RoadcastError::EmptyInput(
                "cannot fit a scaler on an empty training partition".to_string(),
            ));
        }

        let scaler: Arc<dyn Scaler> = match self {
            ScalerKind::None => {
                info!("NoneScaler");
                Arc::new(NoneScaler)
            }
            ScalerKind::Normal => {
                let max = x.iter().chain(y.iter()).fold(0.0f64, |m, v| m.max(v.abs()));
                let scaler = NormalScaler::new(nonzero("max", max));
                info!("NormalScaler max: {}", scaler.max);
                Arc::new(scaler)
            }
            ScalerKind::Standard => {
                let n = x.len() as f64;
                let mean = x.sum() / n;
                let std = (x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
                let scaler = StandardScaler::new(mean, nonzero("std", std));
                info!("StandardScaler mean: {}, std: {}", scaler.mean, scaler.std);
                Arc::new(scaler)
            }
            ScalerKind::MinMax01 | ScalerKind::MinMax11 => {
                let (min, max) = x
                    .iter()
                    .chain(y.iter())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                let max = if max - min == 0.0 {
                    warn!("min == max == {}; min-max scaling with unit range", min);
                    min + 1.0
                } else {
                    max
                };
                if *self == ScalerKind::MinMax01 {
                    let scaler = MinMax01Scaler::new(min, max);
                    info!("MinMax01Scaler max: {}, min: {}", scaler.max, scaler.min);
                    Arc::new(scaler)
                } else {
                    let scaler = MinMax11Scaler::new(min, max);
                    info!("MinMax11Scaler max: {}, min: {}", scaler.max, scaler.min);
                    Arc::new(scaler)
                }
            }
        };
        Ok(scaler)
    }
}

/// Replaces a zero or non-finite divisor with 1 so the transform stays invertible.
fn nonzero(stat: &str, value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        warn!("Degenerate scaler {} = {}; using 1.0", stat, value);
        1.0
    } else {
        value
    }
}
