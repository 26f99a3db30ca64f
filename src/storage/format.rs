//! Binary format for cached dataset splits.
//!
//! ## Format Layout
//!
//! ```text
//! +------------------+
//! | Header (64 bytes)|
//! +------------------+
//! | Payload          |
//! | (variable)       |
//! +------------------+
//! ```
//!
//! ### Header (64 bytes)
//! - Magic number (4 bytes): "RDCC"
//! - Version (2 bytes)
//! - Flags (2 bytes): bit 0 = payload is zstd-compressed
//! - Number of arrays (4 bytes)
//! - Reserved (4 bytes)
//! - Payload length (8 bytes)
//! - Configuration digest (32 bytes)
//! - Reserved (8 bytes)
//!
//! ### Payload
//! - bincode-encoded list of `(name, array)` pairs, one per split array

use crate::error::{Result, RoadcastError};
use crate::series::SplitData;
use memmap2::MmapOptions;
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Magic number for roadcast cache files.
const MAGIC: &[u8; 4] = b"RDCC";

/// Current format version.
const VERSION: u16 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 64;

/// Flag indicating the payload is zstd-compressed.
const FLAG_ZSTD: u16 = 0x0001;

/// zstd level used when compressing.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Cache file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeader {
    /// Format version.
    pub version: u16,
    /// Flags.
    pub flags: u16,
    /// Number of stored arrays.
    pub num_arrays: u32,
    /// Payload length in bytes.
    pub payload_len: u64,
    /// Digest of the configuration that produced the arrays.
    pub digest: [u8; 32],
}

impl CacheHeader {
    /// Creates a new header.
    pub fn new(digest: [u8; 32], num_arrays: u32, payload_len: u64, compressed: bool) -> Self {
        Self {
            version: VERSION,
            flags: if compressed { FLAG_ZSTD } else { 0 },
            num_arrays,
            payload_len,
            digest,
        }
    }

    /// Returns true if the payload is zstd-compressed.
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_ZSTD != 0
    }

    /// Writes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.num_arrays.to_le_bytes());
        // Reserved (bytes 12-15)
        bytes[16..24].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes[24..56].copy_from_slice(&self.digest);
        // Reserved (bytes 56-63)
        bytes
    }

    /// Reads a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(RoadcastError::InvalidCache("Header too short".to_string()));
        }
        if &bytes[0..4] != MAGIC {
            return Err(RoadcastError::InvalidCache("Invalid magic number".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(RoadcastError::InvalidCache(format!(
                "unsupported version {}",
                version
            )));
        }
        let flags = u16::from_le_bytes([bytes[6], bytes[7]]);
        let num_arrays = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let mut payload_len = [0u8; 8];
        payload_len.copy_from_slice(&bytes[16..24]);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes[24..56]);

        Ok(Self {
            version,
            flags,
            num_arrays,
            payload_len: u64::from_le_bytes(payload_len),
            digest,
        })
    }
}

#[derive(Serialize)]
struct NamedArrayRef<'a> {
    name: &'a str,
    data: &'a Array4<f64>,
}

#[derive(Deserialize)]
struct NamedArray {
    name: String,
    data: Array4<f64>,
}

/// Binary format reader/writer for cache files.
pub struct CacheFormat;

impl CacheFormat {
    /// Writes the six split arrays under `digest`, creating parent directories.
    pub fn write<P: AsRef<Path>>(
        path: P,
        digest: [u8; 32],
        data: &SplitData,
        compression_level: Option<i32>,
    ) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let arrays: Vec<NamedArrayRef<'_>> = data
            .named_arrays()
            .into_iter()
            .map(|(name, array)| NamedArrayRef { name, data: array })
            .collect();
        let encoded = bincode::serialize(&arrays)?;
        let payload = match compression_level {
            Some(level) => zstd::encode_all(encoded.as_slice(), level)?,
            None => encoded,
        };

        let header = CacheHeader::new(
            digest,
            arrays.len() as u32,
            payload.len() as u64,
            compression_level.is_some(),
        );

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&header.to_bytes())?;
        writer.write_all(&payload)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads only the header of a cache file.
    pub fn read_header<P: AsRef<Path>>(path: P) -> Result<CacheHeader> {
        let file = File::open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        CacheHeader::from_bytes(&mmap)
    }

    /// Reads a cache file, checking its digest when `expected` is given.
    pub fn read<P: AsRef<Path>>(
        path: P,
        expected: Option<&[u8; 32]>,
    ) -> Result<(CacheHeader, SplitData)> {
        let file = File::open(path)?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        let header = CacheHeader::from_bytes(&mmap)?;

        if let Some(expected) = expected {
            if &header.digest != expected {
                return Err(RoadcastError::InvalidCache(
                    "configuration digest does not match".to_string(),
                ));
            }
        }

        let end = HEADER_SIZE as u64 + header.payload_len;
        if (mmap.len() as u64) < end {
            return Err(RoadcastError::InvalidCache("truncated payload".to_string()));
        }
        let payload = &mmap[HEADER_SIZE..end as usize];

        let arrays = decode_payload(payload, header.is_compressed())?;
        if arrays.len() != header.num_arrays as usize {
            return Err(RoadcastError::InvalidCache(format!(
                "header lists {} arrays, payload holds {}",
                header.num_arrays,
                arrays.len()
            )));
        }

        let data = SplitData::from_named(arrays.into_iter().map(|a| (a.name, a.data)).collect())?;
        Ok((header, data))
    }
}

/// Decodes the payload; any zstd or bincode failure means the file is corrupt.
fn decode_payload(payload: &[u8], compressed: bool) -> Result<Vec<NamedArray>> {
    let corrupt = |e: &dyn std::fmt::Display| {
        RoadcastError::InvalidCache(format!("corrupt payload: {}", e))
    };
    if compressed {
        let decoded = zstd::decode_all(payload).map_err(|e| corrupt(&e))?;
        bincode::deserialize(&decoded).map_err(|e| corrupt(&e))
    } else {
        bincode::deserialize(payload).map_err(|e| corrupt(&e))
    }
}
