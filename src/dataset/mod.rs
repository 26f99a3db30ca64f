//! Dataset preparation: table loading, feature engineering, caching and batching.
//!
//! [`TrafficSpeedDataset`] wires the stages together:
//!
//! 1. Load the entity table and, when present, the relation table
//! 2. Build the adjacency matrix (optionally Gaussian-weighted)
//! 3. Load the dynamic table and append temporal channels
//! 4. Window the series and split it chronologically
//! 5. Fit a scaler on the training partition and scale all partitions
//! 6. Hand out one [`DataLoader`] per partition

mod loader;
mod traffic;

pub use loader::{Batch, Batches, DataLoader};
pub use traffic::{DataFeature, PreparedData, TrafficSpeedDataset};
