//! Time-series preparation: temporal features, windowing and splitting.
//!
//! The stages are pure functions over `ndarray` tensors and run in order:
//!
//! 1. [`add_time_features`] appends calendar channels to `(time, node, feature)` data
//! 2. [`generate_windows`] slices supervised `(x, y)` pairs
//! 3. [`SplitSizes`] and [`SplitData`] partition the pairs chronologically

mod split;
mod temporal;
mod window;

pub use split::{SplitData, SplitSizes, SPLIT_NAMES};
pub use temporal::add_time_features;
pub use window::{generate_windows, window_offsets, WindowedSamples};
