//! Chronological train/validation/test partitioning.

use crate::error::{Result, RoadcastError};
use crate::series::WindowedSamples;
use log::info;
use ndarray::{s, Array4};
use serde::{Deserialize, Serialize};

/// Names of the six split arrays, in storage order.
pub const SPLIT_NAMES: [&str; 6] = ["x_train", "y_train", "x_val", "y_val", "x_test", "y_test"];

/// Sample counts of each partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSizes {
    /// Training samples (earliest).
    pub train: usize,
    /// Validation samples.
    pub val: usize,
    /// Test samples (latest).
    pub test: usize,
}

impl SplitSizes {
    /// Computes partition sizes for `num_samples` windows.
    ///
    /// Test and train counts are `num_samples * rate` rounded half-to-even;
    /// validation takes whatever remains.
    pub fn new(num_samples: usize, train_rate: f64, eval_rate: f64) -> Result<Self> {
        for (name, rate) in [("train_rate", train_rate), ("eval_rate", eval_rate)] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(RoadcastError::Configuration(format!(
                    "{} must lie in [0, 1], got {}",
                    name, rate
                )));
            }
        }

        let test_rate = 1.0 - train_rate - eval_rate;
        if test_rate < -f64::EPSILON {
            return Err(RoadcastError::Configuration(format!(
                "train_rate + eval_rate = {} exceeds 1",
                train_rate + eval_rate
            )));
        }
        let test_rate = test_rate.max(0.0);

        let n = num_samples as f64;
        let test = (n * test_rate).round_ties_even() as usize;
        let train = (n * train_rate).round_ties_even() as usize;
        let val = num_samples.checked_sub(test + train).ok_or_else(|| {
            RoadcastError::Configuration(format!(
                "rounded split {} train + {} test exceeds {} samples",
                train, test, num_samples
            ))
        })?;

        Ok(Self { train, val, test })
    }

    /// Total number of samples.
    pub fn total(&self) -> usize {
        self.train + self.val + self.test
    }
}

/// The six partition arrays handed to scaling, caching and batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitData {
    /// Training inputs.
    pub x_train: Array4<f64>,
    /// Training targets.
    pub y_train: Array4<f64>,
    /// Validation inputs.
    pub x_val: Array4<f64>,
    /// Validation targets.
    pub y_val: Array4<f64>,
    /// Test inputs.
    pub x_test: Array4<f64>,
    /// Test targets.
    pub y_test: Array4<f64>,
}

impl SplitData {
    /// Splits windowed samples chronologically: train first, then validation, then test.
    pub fn from_windows(windows: &WindowedSamples, sizes: SplitSizes) -> Result<Self> {
        let total = windows.len();
        if sizes.total() != total {
            return Err(RoadcastError::ShapeMismatch(format!(
                "split sizes sum to {} but there are {} samples",
                sizes.total(),
                total
            )));
        }

        let val_end = sizes.train + sizes.val;
        let test_start = total - sizes.test;
        let data = Self {
            x_train: windows.x.slice(s![..sizes.train, .., .., ..]).to_owned(),
            y_train: windows.y.slice(s![..sizes.train, .., .., ..]).to_owned(),
            x_val: windows.x.slice(s![sizes.train..val_end, .., .., ..]).to_owned(),
            y_val: windows.y.slice(s![sizes.train..val_end, .., .., ..]).to_owned(),
            x_test: windows.x.slice(s![test_start.., .., .., ..]).to_owned(),
            y_test: windows.y.slice(s![test_start.., .., .., ..]).to_owned(),
        };

        info!("train\tx: {:?}, y: {:?}", data.x_train.shape(), data.y_train.shape());
        info!("eval\tx: {:?}, y: {:?}", data.x_val.shape(), data.y_val.shape());
        info!("test\tx: {:?}, y: {:?}", data.x_test.shape(), data.y_test.shape());
        Ok(data)
    }

    /// Builds split data from arrays named as in [`SPLIT_NAMES`].
    pub fn from_named(mut arrays: Vec<(String, Array4<f64>)>) -> Result<Self> {
        let mut take = |name: &str| -> Result<Array4<f64>> {
            let pos = arrays
                .iter()
                .position(|(n, _)| n == name)
                .ok_or_else(|| RoadcastError::InvalidCache(format!("array `{}` is missing", name)))?;
            Ok(arrays.swap_remove(pos).1)
        };
        Ok(Self {
            x_train: take("x_train")?,
            y_train: take("y_train")?,
            x_val: take("x_val")?,
            y_val: take("y_val")?,
            x_test: take("x_test")?,
            y_test: take("y_test")?,
        })
    }

    /// The six arrays paired with their names, in [`SPLIT_NAMES`] order.
    pub fn named_arrays(&self) -> [(&'static str, &Array4<f64>); 6] {
        [
            (SPLIT_NAMES[0], &self.x_train),
            (SPLIT_NAMES[1], &self.y_train),
            (SPLIT_NAMES[2], &self.x_val),
            (SPLIT_NAMES[3], &self.y_val),
            (SPLIT_NAMES[4], &self.x_test),
            (SPLIT_NAMES[5], &self.y_test),
        ]
    }

    /// Mutable references to all six arrays.
    pub fn arrays_mut(&mut self) -> Vec<&mut Array4<f64>> {
        vec![
            &mut self.x_train,
            &mut self.y_train,
            &mut self.x_val,
            &mut self.y_val,
            &mut self.x_test,
            &mut self.y_test,
        ]
    }

    /// Size of the trailing feature axis.
    pub fn feature_dim(&self) -> usize {
        self.x_train.shape()[3]
    }
}
