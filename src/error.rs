//! Error types for the roadcast dataset pipeline and embedding models.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for roadcast operations.
#[derive(Error, Debug)]
pub enum RoadcastError {
    /// A required input table does not exist.
    #[error("Missing input file: {0}")]
    MissingInput(PathBuf),

    /// A weight or feature column cannot be determined from the table.
    #[error("Ambiguous column: {0}")]
    AmbiguousColumn(String),

    /// Invalid configuration value or combination.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Table contents do not line up with the entity table.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A cell could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The cache file is corrupt or belongs to another configuration.
    #[error("Invalid cache file: {0}")]
    InvalidCache(String),

    /// Empty input.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Index out of bounds.
    #[error("Index out of bounds: {index} >= {max}")]
    IndexOutOfBounds {
        /// The index that was out of bounds.
        index: usize,
        /// The maximum allowed index.
        max: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited table reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for roadcast operations.
pub type Result<T> = std::result::Result<T, RoadcastError>;

impl From<bincode::Error> for RoadcastError {
    fn from(err: bincode::Error) -> Self {
        RoadcastError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for RoadcastError {
    fn from(err: serde_json::Error) -> Self {
        RoadcastError::Serialization(err.to_string())
    }
}
