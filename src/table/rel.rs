//! Relation table: weighted origin/destination pairs.

use crate::error::{Result, RoadcastError};
use crate::table::{open_table, parse_cell, required_column, table_reader};
use log::info;
use std::io::Read;
use std::path::Path;

/// Columns every relation table carries before its properties.
const FIXED_COLUMNS: usize = 4;

/// One weighted relation between two entity identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Origin entity identifier.
    pub origin: String,
    /// Destination entity identifier.
    pub destination: String,
    /// Raw weight (usually a distance).
    pub weight: f64,
}

/// The rows of a `.rel` table that carry a weight.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationTable {
    /// Name of the column the weights were read from.
    pub weight_col: String,
    /// Relations in table order. Rows with an empty weight are dropped.
    pub relations: Vec<Relation>,
}

impl RelationTable {
    /// Loads the `.rel` table at `path`.
    ///
    /// `weight_col` names the weight column; when empty, the table must have
    /// exactly one property column, which is then used.
    pub fn load<P: AsRef<Path>>(path: P, weight_col: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = open_table(path)?;
        let table = Self::read_records(&mut reader, weight_col)?;
        info!(
            "Loaded file {}, {} weighted relations from column `{}`",
            path.display(),
            table.relations.len(),
            table.weight_col
        );
        Ok(table)
    }

    /// Parses a relation table from any reader.
    pub fn from_reader<R: Read>(source: R, weight_col: &str) -> Result<Self> {
        Self::read_records(&mut table_reader(source), weight_col)
    }

    fn read_records<R: Read>(reader: &mut csv::Reader<R>, weight_col: &str) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let origin_col = required_column(&headers, "origin_id")?;
        let destination_col = required_column(&headers, "destination_id")?;

        let (weight_idx, weight_name) = if weight_col.is_empty() {
            if headers.len() != FIXED_COLUMNS + 1 {
                return Err(RoadcastError::AmbiguousColumn(format!(
                    "relation table has {} property columns; set `weight_col`",
                    headers.len().saturating_sub(FIXED_COLUMNS)
                )));
            }
            let last = headers.len() - 1;
            (last, headers[last].to_string())
        } else {
            let idx = headers.iter().position(|h| h == weight_col).ok_or_else(|| {
                RoadcastError::AmbiguousColumn(format!(
                    "weight column `{}` not found in relation table",
                    weight_col
                ))
            })?;
            (idx, weight_col.to_string())
        };

        let mut relations = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let cell = record.get(weight_idx).unwrap_or_default();
            let Some(weight) = parse_cell(cell, row, &weight_name)? else {
                continue;
            };
            relations.push(Relation {
                origin: record.get(origin_col).unwrap_or_default().to_string(),
                destination: record.get(destination_col).unwrap_or_default().to_string(),
                weight,
            });
        }

        Ok(Self {
            weight_col: weight_name,
            relations,
        })
    }

    /// Number of weighted relations.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Returns true if no relation carries a weight.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
