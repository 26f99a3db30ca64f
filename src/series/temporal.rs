//! Calendar feature channels.

use crate::error::{Result, RoadcastError};
use crate::table::{day_of_week, time_of_day};
use chrono::NaiveDateTime;
use ndarray::{s, Array3, Axis};

/// Appends time-of-day and day-of-week channels to `(time, node, feature)` data.
///
/// Channel order is fixed: raw features, then one time-of-day channel in
/// `[0, 1)` when `add_time_in_day`, then a seven-channel one-hot day of week
/// (Monday first) when `add_day_in_week`. Both are identical across nodes.
pub fn add_time_features(
    data: &Array3<f64>,
    timestamps: &[NaiveDateTime],
    add_time_in_day: bool,
    add_day_in_week: bool,
) -> Result<Array3<f64>> {
    let (len_time, num_nodes, feature_dim) = data.dim();
    if timestamps.len() != len_time {
        return Err(RoadcastError::ShapeMismatch(format!(
            "{} timestamps for {} time steps",
            timestamps.len(),
            len_time
        )));
    }

    let extra = usize::from(add_time_in_day) + if add_day_in_week { 7 } else { 0 };
    if extra == 0 {
        return Ok(data.clone());
    }

    let mut out = Array3::zeros((len_time, num_nodes, feature_dim + extra));
    out.slice_mut(s![.., .., ..feature_dim]).assign(data);

    for (ts, mut step) in timestamps.iter().zip(out.axis_iter_mut(Axis(0))) {
        let mut channel = feature_dim;
        if add_time_in_day {
            step.column_mut(channel).fill(time_of_day(ts));
            channel += 1;
        }
        if add_day_in_week {
            step.column_mut(channel + day_of_week(ts)).fill(1.0);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_timestamp;

    fn stamps() -> Vec<NaiveDateTime> {
        // Monday noon, Tuesday 06:00
        vec![
            parse_timestamp("2018-01-01T12:00:00Z").unwrap(),
            parse_timestamp("2018-01-02T06:00:00Z").unwrap(),
        ]
    }

    #[test]
    fn test_no_features_is_identity() {
        let data = Array3::from_elem((2, 3, 1), 5.0);
        let out = add_time_features(&data, &stamps(), false, false).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_channel_order() {
        let data = Array3::from_elem((2, 3, 1), 5.0);
        let out = add_time_features(&data, &stamps(), true, true).unwrap();

        assert_eq!(out.dim(), (2, 3, 9));
        for node in 0..3 {
            assert_eq!(out[[0, node, 0]], 5.0);
            assert!((out[[0, node, 1]] - 0.5).abs() < 1e-12);
            assert!((out[[1, node, 1]] - 0.25).abs() < 1e-12);
            // Monday one-hot at channel 2, Tuesday at channel 3.
            assert_eq!(out[[0, node, 2]], 1.0);
            assert_eq!(out[[1, node, 3]], 1.0);
            assert_eq!(out.slice(s![0, node, 2..]).sum(), 1.0);
        }
    }

    #[test]
    fn test_day_of_week_only() {
        let data = Array3::zeros((2, 1, 2));
        let out = add_time_features(&data, &stamps(), false, true).unwrap();
        assert_eq!(out.dim(), (2, 1, 9));
        assert_eq!(out[[1, 0, 3]], 1.0);
    }

    #[test]
    fn test_timestamp_count_mismatch() {
        let data = Array3::zeros((3, 1, 1));
        assert!(add_time_features(&data, &stamps(), true, false).is_err());
    }
}
