//! Sliding input/target windows.

use crate::error::{Result, RoadcastError};
use log::info;
use ndarray::{s, Array3, Array4, Axis};

/// Supervised pairs cut from a time series.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedSamples {
    /// Inputs, shape `(samples, input_window, nodes, features)`.
    pub x: Array4<f64>,
    /// Targets, shape `(samples, output_window, nodes, features)`.
    pub y: Array4<f64>,
}

impl WindowedSamples {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.dim().0
    }

    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Relative offsets read for inputs and targets around an anchor step `t`.
///
/// Inputs cover `-(input_window - 1)..=0`, targets `1..=output_window`.
pub fn window_offsets(input_window: usize, output_window: usize) -> (Vec<isize>, Vec<isize>) {
    let x_offsets = (-(input_window as isize) + 1..=0).collect();
    let y_offsets = (1..=output_window as isize).collect();
    (x_offsets, y_offsets)
}

/// Slices `(time, node, feature)` data into chronological input/target pairs.
///
/// Every anchor `t` in `input_window - 1 .. len_time - output_window` yields
/// one sample, giving `len_time - input_window - output_window + 1` samples.
pub fn generate_windows(
    data: &Array3<f64>,
    input_window: usize,
    output_window: usize,
) -> Result<WindowedSamples> {
    if input_window == 0 || output_window == 0 {
        return Err(RoadcastError::Configuration(
            "input_window and output_window must be positive".to_string(),
        ));
    }

    let (len_time, num_nodes, feature_dim) = data.dim();
    let span = input_window + output_window;
    if len_time < span {
        return Err(RoadcastError::Configuration(format!(
            "series of {} steps is shorter than input_window + output_window = {}",
            len_time, span
        )));
    }
    let num_samples = len_time - span + 1;

    let mut x = Array4::zeros((num_samples, input_window, num_nodes, feature_dim));
    let mut y = Array4::zeros((num_samples, output_window, num_nodes, feature_dim));

    let (x_offsets, y_offsets) = window_offsets(input_window, output_window);
    let anchors = input_window - 1..len_time - output_window;

    for (sample, t) in anchors.enumerate() {
        for (step, &offset) in x_offsets.iter().enumerate() {
            x.slice_mut(s![sample, step, .., ..])
                .assign(&data.index_axis(Axis(0), t.wrapping_add_signed(offset)));
        }
        for (step, &offset) in y_offsets.iter().enumerate() {
            y.slice_mut(s![sample, step, .., ..])
                .assign(&data.index_axis(Axis(0), t.wrapping_add_signed(offset)));
        }
    }

    info!("Dataset created");
    info!("x shape: {:?}, y shape: {:?}", x.shape(), y.shape());
    Ok(WindowedSamples { x, y })
}
