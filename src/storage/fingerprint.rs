//! Configuration fingerprints used as cache keys.

use crate::config::DatasetConfig;
use crate::error::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Bumped whenever the cached arrays change meaning for the same configuration.
pub const FINGERPRINT_VERSION: u32 = 1;

/// Every option that changes the cached split arrays.
///
/// Field order is part of the canonical form; the digest is taken over the
/// JSON encoding of this record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheKey {
    version: u32,
    dataset: String,
    input_window: usize,
    output_window: usize,
    train_rate: f64,
    eval_rate: f64,
    scaler: String,
    add_time_in_day: bool,
    add_day_in_week: bool,
    data_col: Option<Vec<String>>,
}

impl CacheKey {
    /// Extracts the cache-relevant options from a dataset configuration.
    pub fn from_config(config: &DatasetConfig) -> Self {
        Self {
            version: FINGERPRINT_VERSION,
            dataset: config.dataset.clone(),
            input_window: config.input_window,
            output_window: config.output_window,
            train_rate: config.train_rate,
            eval_rate: config.eval_rate,
            scaler: config.scaler.clone(),
            add_time_in_day: config.add_time_in_day,
            add_day_in_week: config.add_day_in_week,
            data_col: config.data_col.selected(),
        }
    }

    /// SHA-256 over the canonical encoding.
    pub fn digest(&self) -> Result<[u8; 32]> {
        let canonical = serde_json::to_vec(self)?;
        Ok(Sha256::digest(&canonical).into())
    }

    /// Hex fingerprint (first 16 digest bytes).
    pub fn fingerprint(&self) -> Result<String> {
        let digest = self.digest()?;
        Ok(digest[..16].iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Cache file location inside `cache_dir`.
    pub fn cache_path(&self, cache_dir: &Path) -> Result<PathBuf> {
        Ok(cache_dir.join(format!(
            "point_based_{}_{}.cache",
            self.dataset,
            self.fingerprint()?
        )))
    }
}
