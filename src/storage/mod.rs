//! Storage module for the fingerprinted split cache.

mod fingerprint;
mod format;

pub use fingerprint::{CacheKey, FINGERPRINT_VERSION};
pub use format::{CacheFormat, CacheHeader, DEFAULT_COMPRESSION_LEVEL};
