//! Point-based traffic dataset built from `.geo`, `.rel` and `.dyna` tables.

use crate::config::DatasetConfig;
use crate::dataset::DataLoader;
use crate::error::{Result, RoadcastError};
use crate::graph::AdjacencyMatrix;
use crate::scaler::{scale_channels, Scaler, ScalerKind};
use crate::series::{add_time_features, generate_windows, SplitData, SplitSizes};
use crate::storage::{CacheFormat, CacheKey, DEFAULT_COMPRESSION_LEVEL};
use crate::table::{DynamicTable, EntityTable, RelationTable};
use log::{info, warn};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

/// Fitted state a model needs alongside the loaders.
#[derive(Debug, Clone)]
pub struct DataFeature {
    /// Scaler fitted on the training partition.
    pub scaler: Arc<dyn Scaler>,
    /// Adjacency matrix, absent when the dataset has no relation table.
    pub adj_mx: Option<AdjacencyMatrix>,
    /// Number of graph nodes.
    pub num_nodes: usize,
    /// Number of finite non-zero adjacency cells.
    pub num_edges: usize,
    /// Channels per node and step, temporal channels included.
    pub feature_dim: usize,
    /// Leading channels the model predicts.
    pub output_dim: usize,
}

/// Loaders for the three partitions plus the fitted features.
#[derive(Debug)]
pub struct PreparedData {
    /// Training loader; shuffles when configured.
    pub train: DataLoader,
    /// Validation loader.
    pub eval: DataLoader,
    /// Test loader.
    pub test: DataLoader,
    /// Fitted dataset features.
    pub feature: DataFeature,
}

/// Traffic dataset where every graph node is a sensor with a time series.
pub struct TrafficSpeedDataset {
    config: DatasetConfig,
    scaler_kind: ScalerKind,
    entities: EntityTable,
    adj_mx: Option<AdjacencyMatrix>,
    cache_key: CacheKey,
}

impl TrafficSpeedDataset {
    /// Loads the static tables for `config.dataset`.
    ///
    /// The entity table is required. The relation table is optional; when
    /// present it becomes the adjacency matrix, Gaussian-weighted if
    /// `calculate_weight` is set.
    pub fn new(config: DatasetConfig) -> Result<Self> {
        let scaler_kind: ScalerKind = config.scaler.parse()?;
        if config.batch_size == 0 {
            return Err(RoadcastError::Configuration(
                "batch_size must be positive".to_string(),
            ));
        }

        let entities = EntityTable::load(config.table_path("geo"))?;

        let rel_path = config.table_path("rel");
        let adj_mx = if rel_path.exists() {
            let relations = RelationTable::load(&rel_path, &config.weight_col)?;
            let mut adj = AdjacencyMatrix::from_relations(&entities, &relations);
            if config.calculate_weight {
                adj = adj.gaussian_kernel(config.adj_epsilon)?;
            }
            info!("Max adj_mx value = {}", max_finite(&adj));
            Some(adj)
        } else {
            info!("No relation table at {}, skipping adjacency", rel_path.display());
            None
        };

        let cache_key = CacheKey::from_config(&config);
        Ok(Self {
            config,
            scaler_kind,
            entities,
            adj_mx,
            cache_key,
        })
    }

    /// The dataset configuration.
    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// The loaded entity table.
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    /// The adjacency matrix, if a relation table was present.
    pub fn adjacency(&self) -> Option<&AdjacencyMatrix> {
        self.adj_mx.as_ref()
    }

    /// Number of graph nodes.
    pub fn num_nodes(&self) -> usize {
        self.entities.len()
    }

    /// Location of this configuration's cache file.
    pub fn cache_path(&self) -> Result<PathBuf> {
        self.cache_key.cache_path(&self.config.cache_dir)
    }

    /// Builds the split arrays from the raw tables and caches them when enabled.
    pub fn generate_splits(&self) -> Result<SplitData> {
        let columns = self.config.data_col.selected();
        let table = DynamicTable::load(
            self.config.table_path("dyna"),
            &self.entities,
            columns.as_deref(),
        )?;

        let data = add_time_features(
            &table.data,
            &table.timestamps,
            self.config.add_time_in_day,
            self.config.add_day_in_week,
        )?;
        let windows = generate_windows(&data, self.config.input_window, self.config.output_window)?;
        let sizes = SplitSizes::new(windows.len(), self.config.train_rate, self.config.eval_rate)?;
        let splits = SplitData::from_windows(&windows, sizes)?;

        if self.config.cache_dataset {
            let path = self.cache_path()?;
            CacheFormat::write(
                &path,
                self.cache_key.digest()?,
                &splits,
                Some(DEFAULT_COMPRESSION_LEVEL),
            )?;
            info!("Saved at {}", path.display());
        }
        Ok(splits)
    }

    /// Reads the split arrays from the cache.
    ///
    /// Returns `Ok(None)` when caching is disabled, the file is absent, it
    /// was written for a different configuration, or its payload is corrupt.
    pub fn load_splits(&self) -> Result<Option<SplitData>> {
        if !self.config.cache_dataset {
            return Ok(None);
        }
        let path = self.cache_path()?;
        if !path.exists() {
            return Ok(None);
        }

        info!("Loading {}", path.display());
        match CacheFormat::read(&path, Some(&self.cache_key.digest()?)) {
            Ok((_, splits)) => {
                info!("train\tx: {:?}, y: {:?}", splits.x_train.shape(), splits.y_train.shape());
                info!("eval\tx: {:?}, y: {:?}", splits.x_val.shape(), splits.y_val.shape());
                info!("test\tx: {:?}, y: {:?}", splits.x_test.shape(), splits.y_test.shape());
                Ok(Some(splits))
            }
            Err(RoadcastError::InvalidCache(reason)) => {
                warn!("Ignoring cache {}: {}", path.display(), reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Number of leading channels the model predicts for a given feature width.
    pub fn resolve_output_dim(&self, feature_dim: usize) -> Result<usize> {
        if self.config.output_dim > 0 {
            if self.config.output_dim > feature_dim {
                return Err(RoadcastError::Configuration(format!(
                    "output_dim {} exceeds feature_dim {}",
                    self.config.output_dim, feature_dim
                )));
            }
            return Ok(self.config.output_dim);
        }

        match feature_dim.checked_sub(self.config.temporal_channels()) {
            Some(dim) if dim > 0 => Ok(dim),
            _ => Err(RoadcastError::Configuration(format!(
                "feature_dim {} leaves no channels after {} temporal channels",
                feature_dim,
                self.config.temporal_channels()
            ))),
        }
    }

    /// Prepares scaled split arrays and returns loaders for train, eval and test.
    pub fn get_data(&self) -> Result<PreparedData> {
        let mut splits = match self.load_splits()? {
            Some(splits) => splits,
            None => self.generate_splits()?,
        };

        let feature_dim = splits.feature_dim();
        let output_dim = self.resolve_output_dim(feature_dim)?;
        let scaler = self
            .scaler_kind
            .fit(splits.x_train.view(), splits.y_train.view(), output_dim)?;

        splits
            .arrays_mut()
            .into_par_iter()
            .for_each(|array| scale_channels(scaler.as_ref(), array, output_dim));

        let SplitData {
            x_train,
            y_train,
            x_val,
            y_val,
            x_test,
            y_test,
        } = splits;
        let batch_size = self.config.batch_size;
        let pad = self.config.pad_with_last_sample;
        let workers = self.config.num_workers;

        let mut train = DataLoader::new(x_train, y_train, batch_size, pad)?.with_num_workers(workers);
        if self.config.shuffle {
            train = train.with_shuffle(self.config.seed);
        }
        let eval = DataLoader::new(x_val, y_val, batch_size, pad)?.with_num_workers(workers);
        let test = DataLoader::new(x_test, y_test, batch_size, pad)?.with_num_workers(workers);

        Ok(PreparedData {
            train,
            eval,
            test,
            feature: self.data_feature(scaler, feature_dim, output_dim),
        })
    }

    /// Bundles fitted state for a model.
    pub fn data_feature(
        &self,
        scaler: Arc<dyn Scaler>,
        feature_dim: usize,
        output_dim: usize,
    ) -> DataFeature {
        DataFeature {
            scaler,
            adj_mx: self.adj_mx.clone(),
            num_nodes: self.num_nodes(),
            num_edges: self.adj_mx.as_ref().map_or(0, AdjacencyMatrix::num_edges),
            feature_dim,
            output_dim,
        }
    }
}

fn max_finite(adj: &AdjacencyMatrix) -> f64 {
    adj.weights()
        .iter()
        .copied()
        .filter(|w| w.is_finite())
        .fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_tables(dir: &Path, steps: usize) {
        fs::write(dir.join("TOY.geo"), "geo_id,type,coordinates\n10,Point,[]\n20,Point,[]\n").unwrap();
        fs::write(
            dir.join("TOY.rel"),
            "rel_id,type,origin_id,destination_id,cost\n0,geo,10,20,1.0\n1,geo,20,10,3.0\n",
        )
        .unwrap();

        let mut dyna = String::from("dyna_id,type,time,entity_id,traffic_speed\n");
        let mut row = 0;
        for entity in ["10", "20"] {
            for t in 0..steps {
                dyna.push_str(&format!(
                    "{},state,2012-03-01T00:{:02}:00Z,{},{}\n",
                    row,
                    t * 5,
                    entity,
                    t as f64 + if entity == "20" { 100.0 } else { 0.0 }
                ));
                row += 1;
            }
        }
        fs::write(dir.join("TOY.dyna"), dyna).unwrap();
    }

    fn config(dir: &Path) -> DatasetConfig {
        DatasetConfig {
            dataset: "TOY".to_string(),
            data_dir: dir.to_path_buf(),
            cache_dir: dir.join("cache"),
            input_window: 3,
            output_window: 2,
            batch_size: 4,
            train_rate: 0.6,
            eval_rate: 0.2,
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_prepares_loaders() {
        let dir = tempdir().unwrap();
        write_tables(dir.path(), 12);
        let dataset = TrafficSpeedDataset::new(config(dir.path())).unwrap();
        let prepared = dataset.get_data().unwrap();

        // 12 - 3 - 2 + 1 = 8 samples -> train 5, test 2, val 1.
        assert_eq!(prepared.train.num_samples(), 5);
        assert_eq!(prepared.eval.num_samples(), 1);
        assert_eq!(prepared.test.num_samples(), 2);
        assert_eq!(prepared.feature.num_nodes, 2);
        assert_eq!(prepared.feature.num_edges, 2);
        assert_eq!(prepared.feature.feature_dim, 1);
        assert_eq!(prepared.feature.output_dim, 1);
        assert!(prepared.train.shuffles());
        assert!(!prepared.eval.shuffles());
    }

    #[test]
    fn test_output_dim_excludes_temporal_channels() {
        let dir = tempdir().unwrap();
        write_tables(dir.path(), 12);
        let mut cfg = config(dir.path());
        cfg.add_time_in_day = true;
        cfg.add_day_in_week = true;
        cfg.scaler = "standard".to_string();
        let dataset = TrafficSpeedDataset::new(cfg).unwrap();
        let prepared = dataset.get_data().unwrap();

        assert_eq!(prepared.feature.feature_dim, 9);
        assert_eq!(prepared.feature.output_dim, 1);
        assert!(dataset.resolve_output_dim(7).is_err());
    }

    #[test]
    fn test_cache_is_reused() {
        let dir = tempdir().unwrap();
        write_tables(dir.path(), 12);
        let dataset = TrafficSpeedDataset::new(config(dir.path())).unwrap();

        assert!(dataset.load_splits().unwrap().is_none());
        let generated = dataset.generate_splits().unwrap();
        assert!(dataset.cache_path().unwrap().exists());
        let cached = dataset.load_splits().unwrap().unwrap();
        assert_eq!(cached, generated);
    }

    #[test]
    fn test_corrupt_cache_is_regenerated() {
        let dir = tempdir().unwrap();
        write_tables(dir.path(), 12);
        let dataset = TrafficSpeedDataset::new(config(dir.path())).unwrap();
        let generated = dataset.generate_splits().unwrap();

        let path = dataset.cache_path().unwrap();
        let mut bytes = fs::read(&path).unwrap();
        // Keep the 64-byte header, destroy the payload.
        for b in &mut bytes[64..] {
            *b = 0xFF;
        }
        fs::write(&path, &bytes).unwrap();

        assert!(dataset.load_splits().unwrap().is_none());
        let prepared = dataset.get_data().unwrap();
        assert_eq!(prepared.test.inputs().as_ref(), &generated.x_test);
        assert!(dataset.load_splits().unwrap().is_some());
    }

    #[test]
    fn test_caching_disabled() {
        let dir = tempdir().unwrap();
        write_tables(dir.path(), 12);
        let mut cfg = config(dir.path());
        cfg.cache_dataset = false;
        let dataset = TrafficSpeedDataset::new(cfg).unwrap();
        dataset.get_data().unwrap();
        assert!(!dataset.cache_path().unwrap().exists());
    }

    #[test]
    fn test_missing_relation_table_is_optional() {
        let dir = tempdir().unwrap();
        write_tables(dir.path(), 12);
        fs::remove_file(dir.path().join("TOY.rel")).unwrap();
        let dataset = TrafficSpeedDataset::new(config(dir.path())).unwrap();
        assert!(dataset.adjacency().is_none());
        assert_eq!(dataset.get_data().unwrap().feature.num_edges, 0);
    }

    #[test]
    fn test_unknown_scaler_fails_early() {
        let dir = tempdir().unwrap();
        write_tables(dir.path(), 12);
        let mut cfg = config(dir.path());
        cfg.scaler = "robust".to_string();
        assert!(matches!(
            TrafficSpeedDataset::new(cfg),
            Err(RoadcastError::Configuration(_))
        ));
    }

    #[test]
    fn test_gaussian_weighting() {
        let dir = tempdir().unwrap();
        write_tables(dir.path(), 12);
        let mut cfg = config(dir.path());
        cfg.calculate_weight = true;
        let dataset = TrafficSpeedDataset::new(cfg).unwrap();
        let adj = dataset.adjacency().unwrap();
        // Finite distances {1, 3} have population std 1.
        assert!((adj.get(0, 1).unwrap() - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(adj.get(1, 0).unwrap(), 0.0);
    }
}
