//! The `SJZO` codec.
//!
//! File layout (big-endian):
//!
//! ```text
//! "SJZO" | level: u8 | original_length: u32 | chunk_count: u16 | records...
//! ```
//!
//! Record layout:
//!
//! ```text
//! front_index: u8 | length: u16 | hilbert_index: u24 | quaternion: [u8; 6]
//! | payload_len: u32 | payload
//! ```

use std::time::{Duration, Instant};

use bytes::{Buf, BufMut};

use super::OptimizationLevel;
use super::hilbert::{HilbertCurve3D, MAX_WIRE_INDEX};
use super::quaternion::{COMPRESSED_SIZE as QUATERNION_SIZE, Quaternion, QuaternionSpiralEncoder};
use super::scaler::{IntegerScaler, ScalingConfig};
use crate::alphabet::Alphabet;
use crate::codec::{SjzCodec, read_magic, split_chunks};
use crate::config::CodecConfig;
use crate::error::{Result, SjzError};
use crate::io::TextCodec;
use crate::spiral::{SpiralCoordinate, SpiralMapper};

pub const OPTIMIZED_MAGIC: [u8; 4] = *b"SJZO";

/// Magic, level, original length and chunk count.
pub const OPTIMIZED_FILE_HEADER_SIZE: usize = 4 + 1 + 4 + 2;

/// Fixed part of an optimized record.
pub const OPTIMIZED_RECORD_HEADER_SIZE: usize = 1 + 2 + 3 + QUATERNION_SIZE + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedDotRecord {
    pub front_index: u8,
    pub length: u16,
    /// 24-bit curve index of the last character; 0 below level 3.
    pub hilbert_index: u32,
    /// Compressed quaternion of the last character; zeroed below level 3.
    pub quaternion: [u8; QUATERNION_SIZE],
    pub payload: Vec<u8>,
}

impl OptimizedDotRecord {
    pub fn encoded_len(&self) -> usize {
        OPTIMIZED_RECORD_HEADER_SIZE + self.payload.len()
    }

    pub fn validate(&self, chunk_size: u16) -> Result<()> {
        let alphabet_len = Alphabet::get().len();
        if usize::from(self.front_index) >= alphabet_len {
            return Err(SjzError::field_out_of_range(
                "front_index",
                format!("{} >= {alphabet_len}", self.front_index),
            ));
        }
        if self.length == 0 || self.length > chunk_size {
            return Err(SjzError::field_out_of_range(
                "length",
                format!("{} not in [1, {chunk_size}]", self.length),
            ));
        }
        if u64::from(self.hilbert_index) > MAX_WIRE_INDEX {
            return Err(SjzError::field_out_of_range(
                "hilbert_index",
                format!("{} does not fit in 3 bytes", self.hilbert_index),
            ));
        }
        if self.payload.is_empty() {
            return Err(SjzError::EmptyPayload);
        }
        Ok(())
    }

    pub fn write_to<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let payload_len = u32::try_from(self.payload.len()).map_err(|_| {
            SjzError::PayloadTooLarge {
                size: self.payload.len(),
                max: u32::MAX as usize,
            }
        })?;
        if u64::from(self.hilbert_index) > MAX_WIRE_INDEX {
            return Err(SjzError::field_out_of_range(
                "hilbert_index",
                format!("{} does not fit in 3 bytes", self.hilbert_index),
            ));
        }

        buf.put_u8(self.front_index);
        buf.put_u16(self.length);
        buf.put_uint(u64::from(self.hilbert_index), 3);
        buf.put_slice(&self.quaternion);
        buf.put_u32(payload_len);
        buf.put_slice(&self.payload);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Read one record from the front of `buf`, advancing past it.
    pub fn read_from<B: Buf>(buf: &mut B, max_payload_size: usize) -> Result<Self> {
        if buf.remaining() < OPTIMIZED_RECORD_HEADER_SIZE {
            return Err(SjzError::truncated(
                "optimized record header",
                OPTIMIZED_RECORD_HEADER_SIZE,
                buf.remaining(),
            ));
        }

        let front_index = buf.get_u8();
        let length = buf.get_u16();
        let hilbert_index = buf.get_uint(3) as u32;
        let mut quaternion = [0u8; QUATERNION_SIZE];
        buf.copy_to_slice(&mut quaternion);
        let payload_len = buf.get_u32() as usize;

        if payload_len > max_payload_size {
            return Err(SjzError::PayloadTooLarge {
                size: payload_len,
                max: max_payload_size,
            });
        }
        if buf.remaining() < payload_len {
            return Err(SjzError::truncated(
                "optimized record payload",
                payload_len,
                buf.remaining(),
            ));
        }
        let mut payload = vec![0u8; payload_len];
        buf.copy_to_slice(&mut payload);

        Ok(Self {
            front_index,
            length,
            hilbert_index,
            quaternion,
            payload,
        })
    }
}

/// Geometry recovered from a record's metadata fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordGeometry {
    pub grid_point: [u32; 3],
    pub quaternion: Quaternion,
}

/// Sizes and timing of one encode call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionStats {
    /// UTF-8 bytes of the input text.
    pub original_size: usize,
    pub compressed_size: usize,
    pub elapsed: Duration,
}

impl CompressionStats {
    /// `compressed_size / original_size`, or 0 for empty input.
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizedCodec {
    level: OptimizationLevel,
    codec: SjzCodec,
    scaler: IntegerScaler,
    hilbert: HilbertCurve3D,
    quaternion: QuaternionSpiralEncoder,
}

impl Default for OptimizedCodec {
    fn default() -> Self {
        Self {
            level: OptimizationLevel::default(),
            codec: SjzCodec::default(),
            scaler: IntegerScaler::default(),
            hilbert: HilbertCurve3D::default(),
            quaternion: QuaternionSpiralEncoder::default(),
        }
    }
}

impl OptimizedCodec {
    pub fn new(level: OptimizationLevel, config: CodecConfig) -> Result<Self> {
        Self::with_scaling(level, config, ScalingConfig::default())
    }

    pub fn with_scaling(
        level: OptimizationLevel,
        config: CodecConfig,
        scaling: ScalingConfig,
    ) -> Result<Self> {
        Ok(Self {
            level,
            codec: SjzCodec::new(config)?,
            scaler: IntegerScaler::new(scaling)?,
            ..Self::default()
        })
    }

    pub fn level(&self) -> OptimizationLevel {
        self.level
    }

    pub fn config(&self) -> &CodecConfig {
        self.codec.config()
    }

    pub fn scaler(&self) -> &IntegerScaler {
        &self.scaler
    }

    // ========================================================================
    // Chunks
    // ========================================================================

    pub fn encode_chunk(&self, chunk: &str) -> Result<OptimizedDotRecord> {
        let record = self.codec.encode_chunk(chunk)?;
        let front_index = u8::try_from(record.front_index).map_err(|_| {
            SjzError::field_out_of_range("front_index", format!("{} > 255", record.front_index))
        })?;

        let (hilbert_index, quaternion) = if self.level.has_geometry() {
            let last = chunk.chars().next_back().ok_or(SjzError::EmptyText)?;
            self.geometry_of(last)?
        } else {
            (0, [0u8; QUATERNION_SIZE])
        };

        Ok(OptimizedDotRecord {
            front_index,
            length: record.length,
            hilbert_index,
            quaternion,
            payload: record.payload,
        })
    }

    /// Curve index and compressed quaternion for the spiral position of `ch`.
    fn geometry_of(&self, ch: char) -> Result<(u32, [u8; QUATERNION_SIZE])> {
        let props = SpiralMapper::get().get_properties(ch)?;
        let index = self
            .hilbert
            .coords_to_index(self.hilbert.grid_point(props.coordinate))?;
        let hilbert_index = u32::try_from(index)
            .ok()
            .filter(|index| u64::from(*index) <= MAX_WIRE_INDEX)
            .ok_or_else(|| {
                SjzError::field_out_of_range("hilbert_index", format!("{index} does not fit in 3 bytes"))
            })?;

        let quaternion = self
            .quaternion
            .angle_radius_to_quaternion(props.angle_rad, props.radius, props.depth);
        Ok((hilbert_index, self.quaternion.compress(&quaternion)))
    }

    /// Decode a record produced at this codec's level.
    pub fn decode_chunk(&self, record: &OptimizedDotRecord) -> Result<String> {
        self.decode_chunk_at(record, self.level)
    }

    fn decode_chunk_at(
        &self,
        record: &OptimizedDotRecord,
        level: OptimizationLevel,
    ) -> Result<String> {
        record.validate(self.codec.chunk_size())?;
        self.codec.radix().decode(
            u16::from(record.front_index),
            usize::from(record.length),
            &record.payload,
            level.digit_policy(),
        )
    }

    /// Grid point and unit quaternion stored in a record.
    pub fn inspect_record(&self, record: &OptimizedDotRecord) -> Result<RecordGeometry> {
        Ok(RecordGeometry {
            grid_point: self.hilbert.index_to_coords(u64::from(record.hilbert_index))?,
            quaternion: self.quaternion.decompress(&record.quaternion)?,
        })
    }

    // ========================================================================
    // Documents
    // ========================================================================

    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        if text.is_empty() {
            return Err(SjzError::EmptyText);
        }
        let char_count = self.codec.validate_document(text)?;
        let original_length = u32::try_from(char_count).map_err(|_| SjzError::InputTooLarge {
            size: text.len(),
            max: u32::MAX as usize,
        })?;

        let chunks = split_chunks(text, usize::from(self.codec.chunk_size()));
        let max_chunks = self
            .config()
            .max_optimized_chunks
            .min(usize::from(u16::MAX));
        if chunks.len() > max_chunks {
            return Err(SjzError::TooManyChunks {
                count: chunks.len(),
                max: max_chunks,
            });
        }

        #[cfg(feature = "parallel")]
        let records = {
            use rayon::prelude::*;
            chunks
                .par_iter()
                .map(|chunk| self.encode_chunk(chunk))
                .collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let records = chunks
            .iter()
            .map(|chunk| self.encode_chunk(chunk))
            .collect::<Result<Vec<_>>>()?;

        let body: usize = records.iter().map(OptimizedDotRecord::encoded_len).sum();
        let mut out = Vec::with_capacity(OPTIMIZED_FILE_HEADER_SIZE + body);
        out.put_slice(&OPTIMIZED_MAGIC);
        out.put_u8(self.level.as_u8());
        out.put_u32(original_length);
        out.put_u16(records.len() as u16);
        for record in &records {
            record.write_to(&mut out)?;
        }

        log::debug!(
            "sjzip: level {} encoded {} characters into {} chunks ({} bytes)",
            self.level.as_u8(),
            char_count,
            records.len(),
            out.len()
        );
        Ok(out)
    }

    /// [`Self::encode`] plus sizes and elapsed time.
    pub fn encode_with_stats(&self, text: &str) -> Result<(Vec<u8>, CompressionStats)> {
        let start = Instant::now();
        let bytes = self.encode(text)?;
        let stats = CompressionStats {
            original_size: text.len(),
            compressed_size: bytes.len(),
            elapsed: start.elapsed(),
        };
        Ok((bytes, stats))
    }

    /// Decode an `SJZO` stream. The level stored in the header, not this
    /// codec's level, selects the digit policy.
    pub fn decode(&self, data: &[u8]) -> Result<String> {
        let config = self.config();
        let max = config.max_encoded_size();
        if data.len() > max {
            return Err(SjzError::InputTooLarge {
                size: data.len(),
                max,
            });
        }
        if data.len() < OPTIMIZED_FILE_HEADER_SIZE {
            return Err(SjzError::truncated(
                "optimized header",
                OPTIMIZED_FILE_HEADER_SIZE,
                data.len(),
            ));
        }

        let mut buf = data;
        read_magic(&mut buf, OPTIMIZED_MAGIC)?;
        let level_byte = buf.get_u8();
        let level = OptimizationLevel::try_from(level_byte)
            .map_err(|_| SjzError::UnsupportedLevel(level_byte))?;

        let declared = buf.get_u32() as usize;
        if declared > config.max_text_size {
            return Err(SjzError::DeclaredLengthTooLarge {
                declared,
                max: config.max_text_size,
            });
        }

        let chunk_count = usize::from(buf.get_u16());
        if chunk_count > config.max_optimized_chunks {
            return Err(SjzError::TooManyChunks {
                count: chunk_count,
                max: config.max_optimized_chunks,
            });
        }

        let mut text = String::new();
        for ordinal in 0..chunk_count {
            let chunk = OptimizedDotRecord::read_from(&mut buf, config.max_payload_size)
                .and_then(|record| self.decode_chunk_at(&record, level))
                .inspect_err(|err| {
                    log::error!("sjzip: optimized chunk {ordinal} failed to decode: {err}");
                })?;
            text.push_str(&chunk);
        }
        if buf.has_remaining() {
            return Err(SjzError::TrailingData(buf.remaining()));
        }

        let decoded = text.chars().count();
        if decoded > declared {
            log::warn!(
                "sjzip: decoded {decoded} characters but header declares {declared}, truncating"
            );
            let end = text
                .char_indices()
                .nth(declared)
                .map_or(text.len(), |(offset, _)| offset);
            text.truncate(end);
        }

        log::debug!(
            "sjzip: level {} decoded {chunk_count} chunks into {} characters",
            level.as_u8(),
            decoded.min(declared)
        );
        Ok(text)
    }

    // ========================================================================
    // Coordinate sidecar
    // ========================================================================

    /// Count-prefixed batch of the quantized coordinate of every chunk.
    pub fn coordinate_sidecar(&self, text: &str) -> Result<Vec<u8>> {
        if !self.level.has_scaling() {
            return Err(SjzError::field_out_of_range(
                "level",
                "coordinate sidecar needs level 1 or higher",
            ));
        }
        let coordinates: Vec<SpiralCoordinate> = self
            .codec
            .encode_records(text)?
            .into_iter()
            .map(|record| record.coordinate)
            .collect();
        self.scaler.pack_batch(&coordinates)
    }

    pub fn read_coordinate_sidecar(&self, data: &[u8]) -> Result<Vec<SpiralCoordinate>> {
        self.scaler.unpack_batch(data)
    }
}

impl TextCodec for OptimizedCodec {
    const EXTENSION: &'static str = "sjzo";

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        OptimizedCodec::encode(self, text)
    }

    fn decode(&self, data: &[u8]) -> Result<String> {
        OptimizedCodec::decode(self, data)
    }

    fn max_input_size(&self) -> usize {
        self.config().max_encoded_size()
    }
}
