//! Entity table: the canonical node ordering.

use crate::error::{Result, RoadcastError};
use crate::table::{open_table, required_column, table_reader};
use log::info;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Ordered entity identifiers with a dense index per identifier.
///
/// Index `k` is the `k`-th row of the `.geo` table. Every matrix and tensor
/// produced by the pipeline uses this order for its node axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTable {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

impl EntityTable {
    /// Creates an entity table from identifiers in order.
    pub fn new(ids: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(RoadcastError::Parse(format!("duplicate geo_id `{}`", id)));
            }
        }
        Ok(Self { ids, index })
    }

    /// Loads the `.geo` table at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = open_table(path)?;
        let table = Self::read_records(&mut reader)?;
        info!("Loaded file {}, num_nodes={}", path.display(), table.len());
        Ok(table)
    }

    /// Parses an entity table from any reader.
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Self::read_records(&mut table_reader(source))
    }

    fn read_records<R: Read>(reader: &mut csv::Reader<R>) -> Result<Self> {
        let headers = reader.headers()?.clone();
        let id_col = required_column(&headers, "geo_id")?;

        let mut ids = Vec::new();
        for record in reader.records() {
            let record = record?;
            let id = record.get(id_col).unwrap_or_default();
            ids.push(id.to_string());
        }
        Self::new(ids)
    }

    /// Number of entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the table has no entities.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Dense index of an identifier.
    #[inline]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Identifier at a dense index.
    #[inline]
    pub fn id(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    /// Identifiers in canonical order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}
