//! Readers for the raw delimited tables of a dataset.
//!
//! A dataset is three tables sharing a name:
//!
//! - `.geo` - entities (`geo_id`, properties...)
//! - `.rel` - relations (`rel_id, type, origin_id, destination_id`, properties...)
//! - `.dyna` - time-indexed measurements (`dyna_id, type, time, entity_id`, features...)

mod dyna;
mod geo;
mod rel;
mod time;

pub use dyna::DynamicTable;
pub use geo::EntityTable;
pub use rel::{Relation, RelationTable};
pub use time::{day_of_week, parse_timestamp, time_of_day};

use crate::error::{Result, RoadcastError};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::path::Path;

/// Opens a headed CSV table, failing with `MissingInput` if it does not exist.
pub(crate) fn open_table(path: &Path) -> Result<csv::Reader<File>> {
    if !path.exists() {
        return Err(RoadcastError::MissingInput(path.to_path_buf()));
    }
    let reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)?;
    Ok(reader)
}

/// Builds a reader over any byte source with the table conventions.
pub(crate) fn table_reader<R: std::io::Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(source)
}

/// Position of a required column in the header.
pub(crate) fn required_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| RoadcastError::Parse(format!("missing required column `{}`", name)))
}

/// Parses a numeric cell. Empty and NaN cells yield `None`.
pub(crate) fn parse_cell(cell: &str, row: usize, column: &str) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| {
        RoadcastError::Parse(format!(
            "row {}: column `{}` holds non-numeric value `{}`",
            row + 1,
            column,
            cell
        ))
    })?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("1.5", 0, "w").unwrap(), Some(1.5));
        assert_eq!(parse_cell("", 0, "w").unwrap(), None);
        assert_eq!(parse_cell("NaN", 0, "w").unwrap(), None);
        assert!(parse_cell("abc", 0, "w").is_err());
    }

    #[test]
    fn test_missing_table() {
        let err = open_table(Path::new("/nonexistent/table.geo")).unwrap_err();
        assert!(matches!(err, RoadcastError::MissingInput(_)));
    }
}
