//! # Roadcast - Traffic Dataset Pipeline
//!
//! Roadcast turns raw road-network tables into model-ready tensors for
//! spatio-temporal traffic forecasting, and scores graph edges with LINE
//! node embeddings.
//!
//! ## Overview
//!
//! A dataset is three delimited tables sharing a name:
//!
//! - `<name>.geo` - one row per sensor (graph node)
//! - `<name>.rel` - directed relations between sensors, with a weight column
//! - `<name>.dyna` - per-sensor time series, grouped by sensor
//!
//! The pipeline loads them, builds an adjacency matrix (optionally
//! Gaussian-weighted), appends time-of-day and day-of-week channels, slides
//! input/target windows over the series, splits the samples chronologically,
//! caches the split under a configuration fingerprint, scales it with a
//! scaler fitted on the training partition, and hands out batch loaders.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roadcast::{Config, TrafficSpeedDataset};
//!
//! let config = Config::from_file("metr_la.json")?;
//! let dataset = TrafficSpeedDataset::new(config.dataset)?;
//! let mut prepared = dataset.get_data()?;
//!
//! for batch in prepared.train.iter() {
//!     // batch.x: (batch, input_window, nodes, features)
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`table`] - `.geo`, `.rel` and `.dyna` readers
//! - [`graph`] - adjacency matrix and edge sampling
//! - [`series`] - temporal features, windowing and splitting
//! - [`scaler`] - invertible normalization strategies
//! - [`storage`] - fingerprinted split cache
//! - [`dataset`] - pipeline orchestration and batch loading
//! - [`model`] - LINE edge scoring
//!
//! ## Scoring Edges
//!
//! ```rust,ignore
//! use roadcast::{EdgeSampler, Line};
//!
//! let adj = prepared.feature.adj_mx.as_ref().unwrap();
//! let samples = EdgeSampler::new(config.embedding.negative_ratio, Some(7)).sample(adj)?;
//! let model = Line::new(&config.embedding, prepared.feature.num_nodes)?;
//! let loss = model.calculate_loss(&samples)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod model;
pub mod scaler;
pub mod series;
pub mod storage;
pub mod table;

// Re-export commonly used types
pub use config::{Config, DataColumns, DatasetConfig, EmbeddingConfig};
pub use dataset::{Batch, DataFeature, DataLoader, PreparedData, TrafficSpeedDataset};
pub use error::{Result, RoadcastError};
pub use graph::{AdjacencyMatrix, EdgeSample, EdgeSampler};
pub use model::{Line, LineOrder};
pub use scaler::{Scaler, ScalerKind};
pub use series::{SplitData, SplitSizes};
pub use storage::{CacheFormat, CacheHeader, CacheKey};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
