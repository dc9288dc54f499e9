//! Codec configuration: chunk size and the resource ceilings every decode
//! enforces before touching the payload.
//!
//! The config is plain serde data so hosts can keep it next to their own
//! settings as JSON.

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SjzError};
use crate::optimize::OPTIMIZED_FILE_HEADER_SIZE;
use crate::record::RECORD_HEADER_SIZE;

/// Default number of characters per chunk.
pub const DEFAULT_CHUNK_SIZE: u16 = 500;

/// Maximum input size (100 MB).
pub const MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

/// Maximum payload size per chunk (10 MB).
pub const MAX_PAYLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Chunk-count sanity limit for the optimized container.
pub const MAX_OPTIMIZED_CHUNKS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Characters per chunk. Also written into the `SJZ1` header.
    pub chunk_size: u16,
    /// Ceiling on a whole document, in UTF-8 bytes (and in characters).
    pub max_text_size: usize,
    /// Ceiling on a single chunk payload, in bytes.
    pub max_payload_size: usize,
    /// Ceiling on the number of records in an `SJZ1` stream.
    pub max_chunks: usize,
    /// Ceiling on the declared chunk count of an `SJZO` stream.
    pub max_optimized_chunks: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_text_size: MAX_FILE_SIZE,
            max_payload_size: MAX_PAYLOAD_SIZE,
            max_chunks: MAX_FILE_SIZE / 10,
            max_optimized_chunks: MAX_OPTIMIZED_CHUNKS,
        }
    }
}

impl CodecConfig {
    /// Same limits, different chunk size.
    pub fn with_chunk_size(chunk_size: u16) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SjzError::InvalidConfig("chunk_size must be at least 1".into()));
        }
        if self.max_text_size == 0 || self.max_chunks == 0 || self.max_optimized_chunks == 0 {
            return Err(SjzError::InvalidConfig(
                "size and chunk limits must be non-zero".into(),
            ));
        }
        // A full chunk of the largest digit needs at most 8 bits per character.
        if self.max_payload_size < usize::from(self.chunk_size) {
            return Err(SjzError::InvalidConfig(format!(
                "max_payload_size {} cannot hold a chunk of {} characters",
                self.max_payload_size, self.chunk_size
            )));
        }
        Ok(())
    }

    /// Ceiling on an encoded stream, derived from the text ceiling.
    ///
    /// Every chunk payload fits in as many bytes as the chunk has characters
    /// (N < 256), so a document at `max_text_size` needs at most the widest file
    /// header, one widest record header per chunk and `max_text_size` payload bytes.
    pub fn max_encoded_size(&self) -> usize {
        let chunks = self
            .max_text_size
            .div_ceil(usize::from(self.chunk_size.max(1)));
        chunks
            .saturating_mul(RECORD_HEADER_SIZE)
            .saturating_add(OPTIMIZED_FILE_HEADER_SIZE)
            .saturating_add(self.max_text_size)
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse sjzip codec config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file. Missing keys fall back to defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sjzip config from {}", path.display()))?;
        let config = Self::from_json_str(&contents)
            .with_context(|| format!("Invalid sjzip config in {}", path.display()))?;
        log::debug!("sjzip config loaded from {}", path.display());
        Ok(config)
    }
}
