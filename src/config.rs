//! Configuration for the roadcast pipeline.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset preparation configuration.
    pub dataset: DatasetConfig,

    /// Graph-embedding model configuration.
    pub embedding: EmbeddingConfig,
}

impl Config {
    /// Loads a configuration from a JSON file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }
}

/// Which dynamic-table columns to load as features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataColumns {
    /// A single column name. The empty string selects every feature column.
    One(String),
    /// An explicit list of column names.
    Many(Vec<String>),
}

impl Default for DataColumns {
    fn default() -> Self {
        DataColumns::One(String::new())
    }
}

impl DataColumns {
    /// Returns the configured names, or `None` when all columns should be used.
    pub fn selected(&self) -> Option<Vec<String>> {
        match self {
            DataColumns::One(name) if name.is_empty() => None,
            DataColumns::One(name) => Some(vec![name.clone()]),
            DataColumns::Many(names) if names.is_empty() => None,
            DataColumns::Many(names) => Some(names.clone()),
        }
    }
}

/// Dataset preparation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Dataset name; input files are `<data_dir>/<dataset>.{geo,rel,dyna}`.
    /// Default: "".
    pub dataset: String,

    /// Directory holding the raw tables.
    /// Default: "./raw_data".
    pub data_dir: PathBuf,

    /// Directory for cached split arrays.
    /// Default: "./cache/dataset_cache".
    pub cache_dir: PathBuf,

    /// Number of past steps fed to the model.
    /// Default: 12.
    pub input_window: usize,

    /// Number of future steps to predict.
    /// Default: 12.
    pub output_window: usize,

    /// Number of leading feature channels the model predicts.
    /// Default: 0 (derive from the feature dimension minus temporal channels).
    pub output_dim: usize,

    /// Samples per batch.
    /// Default: 64.
    pub batch_size: usize,

    /// Worker count handed to downstream batch consumers.
    /// Default: 1.
    pub num_workers: usize,

    /// Append a time-of-day channel.
    /// Default: false.
    pub add_time_in_day: bool,

    /// Append a one-hot day-of-week block (7 channels).
    /// Default: false.
    pub add_day_in_week: bool,

    /// Complete the last partial batch by repeating its final sample.
    /// Default: true.
    pub pad_with_last_sample: bool,

    /// Relation-table column holding edge weights.
    /// Default: "" (infer when the table has a single property column).
    pub weight_col: String,

    /// Dynamic-table feature columns.
    /// Default: all columns after `entity_id`.
    pub data_col: DataColumns,

    /// Convert raw distances into Gaussian-kernel weights.
    /// Default: false.
    pub calculate_weight: bool,

    /// Weights below this threshold are zeroed after the Gaussian kernel.
    /// Default: 0.1.
    pub adj_epsilon: f64,

    /// Fraction of samples used for training.
    /// Default: 0.7.
    pub train_rate: f64,

    /// Fraction of samples used for validation.
    /// Default: 0.1.
    pub eval_rate: f64,

    /// Scaler selector: none, normal, standard, minmax01, minmax11.
    /// Default: "none".
    pub scaler: String,

    /// Read and write the split cache.
    /// Default: true.
    pub cache_dataset: bool,

    /// Shuffle the training loader on every epoch.
    /// Default: true.
    pub shuffle: bool,

    /// Random seed for the training loader shuffle.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dataset: String::new(),
            data_dir: PathBuf::from("./raw_data"),
            cache_dir: PathBuf::from("./cache/dataset_cache"),
            input_window: 12,
            output_window: 12,
            output_dim: 0,
            batch_size: 64,
            num_workers: 1,
            add_time_in_day: false,
            add_day_in_week: false,
            pad_with_last_sample: true,
            weight_col: String::new(),
            data_col: DataColumns::default(),
            calculate_weight: false,
            adj_epsilon: 0.1,
            train_rate: 0.7,
            eval_rate: 0.1,
            scaler: "none".to_string(),
            cache_dataset: true,
            shuffle: true,
            seed: None,
        }
    }
}

impl DatasetConfig {
    /// Path of a raw table with the given extension.
    pub fn table_path(&self, extension: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", self.dataset, extension))
    }

    /// Number of trailing temporal channels appended by the augmenter.
    #[inline]
    pub fn temporal_channels(&self) -> usize {
        let mut channels = 0;
        if self.add_time_in_day {
            channels += 1;
        }
        if self.add_day_in_week {
            channels += 7;
        }
        channels
    }
}

/// Graph-embedding model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Proximity order: "first" (shared table) or "second" (subject/context).
    /// Default: "first".
    pub order: String,

    /// Embedding vector length.
    /// Default: 128.
    pub embedding_size: usize,

    /// Negative samples drawn per positive edge.
    /// Default: 1.
    pub negative_ratio: usize,

    /// Random seed for table initialization and negative sampling.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            order: "first".to_string(),
            embedding_size: 128,
            negative_ratio: 1,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dataset.input_window, 12);
        assert_eq!(config.dataset.output_window, 12);
        assert_eq!(config.dataset.scaler, "none");
        assert!(config.dataset.cache_dataset);
        assert_eq!(config.embedding.order, "first");
    }

    #[test]
    fn test_temporal_channels() {
        let mut config = DatasetConfig::default();
        assert_eq!(config.temporal_channels(), 0);
        config.add_time_in_day = true;
        config.add_day_in_week = true;
        assert_eq!(config.temporal_channels(), 8);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"dataset": {"dataset": "METR_LA", "data_col": ["speed"], "scaler": "standard"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.dataset.dataset, "METR_LA");
        assert_eq!(config.dataset.batch_size, 64);
        assert_eq!(config.dataset.data_col.selected(), Some(vec!["speed".to_string()]));
        assert_eq!(config.embedding.embedding_size, 128);
    }

    #[test]
    fn test_data_columns_selection() {
        assert_eq!(DataColumns::default().selected(), None);
        assert_eq!(
            DataColumns::One("flow".to_string()).selected(),
            Some(vec!["flow".to_string()])
        );
        assert_eq!(DataColumns::Many(vec![]).selected(), None);
    }

    #[test]
    fn test_table_path() {
        let config = DatasetConfig {
            dataset: "PEMS_BAY".to_string(),
            ..Default::default()
        };
        assert_eq!(config.table_path("geo"), PathBuf::from("./raw_data/PEMS_BAY.geo"));
    }
}
