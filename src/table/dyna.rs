//! Dynamic table: time-indexed measurements per entity.

use crate::error::{Result, RoadcastError};
use crate::table::{open_table, parse_cell, parse_timestamp, required_column, table_reader, EntityTable};
use chrono::NaiveDateTime;
use log::info;
use ndarray::Array3;
use std::io::Read;
use std::path::Path;

/// Columns that never hold features.
const NON_FEATURE_COLUMNS: &[&str] = &["dyna_id", "type", "time", "entity_id"];

/// A dense `(time, entity, feature)` tensor and its timestamps.
#[derive(Debug, Clone)]
pub struct DynamicTable {
    /// One timestamp per leading-axis step.
    pub timestamps: Vec<NaiveDateTime>,
    /// Measurements, shape `(len_time, num_nodes, feature_dim)`.
    pub data: Array3<f64>,
    /// Names of the loaded feature columns, in channel order.
    pub feature_names: Vec<String>,
}

impl DynamicTable {
    /// Loads the `.dyna` table at `path`.
    ///
    /// Rows must be grouped by entity in entity-table order, each entity
    /// covering the same run of timestamps. `columns` selects feature columns;
    /// `None` loads every column after `entity_id`.
    pub fn load<P: AsRef<Path>>(
        path: P,
        entities: &EntityTable,
        columns: Option<&[String]>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = open_table(path)?;
        let table = Self::read_records(&mut reader, entities, columns)?;
        info!("Loaded file {}, shape={:?}", path.display(), table.data.shape());
        Ok(table)
    }

    /// Parses a dynamic table from any reader.
    pub fn from_reader<R: Read>(
        source: R,
        entities: &EntityTable,
        columns: Option<&[String]>,
    ) -> Result<Self> {
        Self::read_records(&mut table_reader(source), entities, columns)
    }

    fn read_records<R: Read>(
        reader: &mut csv::Reader<R>,
        entities: &EntityTable,
        columns: Option<&[String]>,
    ) -> Result<Self> {
        if entities.is_empty() {
            return Err(RoadcastError::EmptyInput("entity table has no rows".to_string()));
        }

        let headers = reader.headers()?.clone();
        let time_col = required_column(&headers, "time")?;
        let entity_col = required_column(&headers, "entity_id")?;

        let feature_cols: Vec<usize> = match columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    headers.iter().position(|h| h == name).ok_or_else(|| {
                        RoadcastError::AmbiguousColumn(format!(
                            "data column `{}` not found in dynamic table",
                            name
                        ))
                    })
                })
                .collect::<Result<_>>()?,
            None => headers
                .iter()
                .enumerate()
                .filter(|(_, h)| !NON_FEATURE_COLUMNS.contains(h))
                .map(|(i, _)| i)
                .collect(),
        };
        if feature_cols.is_empty() {
            return Err(RoadcastError::AmbiguousColumn(
                "dynamic table has no feature columns".to_string(),
            ));
        }
        let feature_names: Vec<String> =
            feature_cols.iter().map(|&i| headers[i].to_string()).collect();

        let mut times = Vec::new();
        let mut entity_ids = Vec::new();
        let mut values = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            times.push(record.get(time_col).unwrap_or_default().to_string());
            entity_ids.push(record.get(entity_col).unwrap_or_default().to_string());
            for (&col, name) in feature_cols.iter().zip(&feature_names) {
                let cell = record.get(col).unwrap_or_default();
                values.push(parse_cell(cell, row, name)?.unwrap_or(f64::NAN));
            }
        }

        let num_nodes = entities.len();
        let num_rows = entity_ids.len();
        if num_rows == 0 {
            return Err(RoadcastError::EmptyInput("dynamic table has no rows".to_string()));
        }
        if num_rows % num_nodes != 0 {
            return Err(RoadcastError::ShapeMismatch(format!(
                "{} rows cannot be split evenly across {} entities",
                num_rows, num_nodes
            )));
        }
        let len_time = num_rows / num_nodes;

        for (node, block) in entity_ids.chunks(len_time).enumerate() {
            let expected = entities.id(node).unwrap_or_default();
            if let Some(found) = block.iter().find(|id| id.as_str() != expected) {
                return Err(RoadcastError::ShapeMismatch(format!(
                    "rows {}..{} should all belong to entity `{}`, found `{}`",
                    node * len_time + 1,
                    (node + 1) * len_time,
                    expected,
                    found
                )));
            }
        }

        let timestamps = times[..len_time]
            .iter()
            .map(|t| parse_timestamp(t))
            .collect::<Result<Vec<_>>>()?;

        let feature_dim = feature_cols.len();
        let by_entity = Array3::from_shape_vec((num_nodes, len_time, feature_dim), values)
            .map_err(|e| RoadcastError::ShapeMismatch(e.to_string()))?;
        let data = by_entity
            .permuted_axes([1, 0, 2])
            .as_standard_layout()
            .into_owned();

        Ok(Self {
            timestamps,
            data,
            feature_names,
        })
    }

    /// Number of timestamps.
    pub fn len_time(&self) -> usize {
        self.timestamps.len()
    }
}
