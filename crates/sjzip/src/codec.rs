//! The base `SJZ1` codec.
//!
//! A document is split into windows of `chunk_size` characters. Every window
//! becomes one [`DotRecord`]; the file is the magic, the chunk size, then the
//! records back to back until end of stream.

use bytes::{Buf, BufMut};

use crate::alphabet::Alphabet;
use crate::config::CodecConfig;
use crate::error::{Result, SjzError};
use crate::mixed_radix::{DigitPolicy, MixedRadix};
use crate::record::DotRecord;
use crate::spiral::SpiralMapper;

pub const MAGIC: [u8; 4] = *b"SJZ1";

/// Magic plus the declared chunk size.
pub const FILE_HEADER_SIZE: usize = 4 + 2;

/// Split `text` into windows of at most `chunk_size` characters.
pub fn split_chunks(text: &str, chunk_size: usize) -> Vec<&str> {
    let mut chunks = Vec::with_capacity(text.len() / chunk_size.max(1) + 1);
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(chunk_size.max(1))
            .map_or(rest.len(), |(offset, _)| offset);
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Read and check a 4-byte magic at the front of `buf`.
pub(crate) fn read_magic<B: Buf>(buf: &mut B, expected: [u8; 4]) -> Result<()> {
    if buf.remaining() < expected.len() {
        return Err(SjzError::truncated("magic", expected.len(), buf.remaining()));
    }
    let mut found = [0u8; 4];
    buf.copy_to_slice(&mut found);
    if found != expected {
        return Err(SjzError::InvalidMagic { expected, found });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SjzCodec {
    config: CodecConfig,
    radix: MixedRadix,
}

impl Default for SjzCodec {
    fn default() -> Self {
        let config = CodecConfig::default();
        Self {
            radix: MixedRadix::new(config.max_payload_size),
            config,
        }
    }
}

impl SjzCodec {
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            radix: MixedRadix::new(config.max_payload_size),
            config,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn chunk_size(&self) -> u16 {
        self.config.chunk_size
    }

    pub(crate) fn radix(&self) -> &MixedRadix {
        &self.radix
    }

    // ========================================================================
    // Chunks
    // ========================================================================

    /// Encode a single chunk of 1..=`chunk_size` characters.
    pub fn encode_chunk(&self, chunk: &str) -> Result<DotRecord> {
        let alphabet = Alphabet::get();
        let len = alphabet.validate_text(chunk, usize::from(self.config.chunk_size))?;
        if len == 0 {
            return Err(SjzError::EmptyText);
        }

        let (front_index, length, payload) = self.radix.encode(chunk)?;
        let last = chunk.chars().next_back().ok_or(SjzError::EmptyText)?;
        let coordinate = SpiralMapper::get().coordinate(last)?;

        Ok(DotRecord {
            front_index,
            length: length as u16,
            coordinate,
            payload,
        })
    }

    /// Decode a single record. Any inconsistency is an error.
    pub fn decode_chunk(&self, record: &DotRecord) -> Result<String> {
        record.validate(self.config.chunk_size)?;
        self.radix.decode(
            record.front_index,
            usize::from(record.length),
            &record.payload,
            DigitPolicy::Strict,
        )
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Validate `text` against the document ceilings.
    pub(crate) fn validate_document(&self, text: &str) -> Result<usize> {
        if text.len() > self.config.max_text_size {
            return Err(SjzError::InputTooLarge {
                size: text.len(),
                max: self.config.max_text_size,
            });
        }
        Alphabet::get().validate_text(text, self.config.max_text_size)
    }

    /// Encode a whole document into records, one per chunk.
    pub fn encode_records(&self, text: &str) -> Result<Vec<DotRecord>> {
        self.validate_document(text)?;
        let chunks = split_chunks(text, usize::from(self.config.chunk_size));
        if chunks.len() > self.config.max_chunks {
            return Err(SjzError::TooManyChunks {
                count: chunks.len(),
                max: self.config.max_chunks,
            });
        }

        #[cfg(feature = "parallel")]
        let records = {
            use rayon::prelude::*;
            chunks
                .par_iter()
                .map(|chunk| self.encode_chunk(chunk))
                .collect::<Result<Vec<_>>>()
        };
        #[cfg(not(feature = "parallel"))]
        let records = chunks
            .iter()
            .map(|chunk| self.encode_chunk(chunk))
            .collect::<Result<Vec<_>>>();

        records
    }

    /// Decode records in order and concatenate their text.
    pub fn decode_records(&self, records: &[DotRecord]) -> Result<String> {
        let mut text = String::new();
        for (ordinal, record) in records.iter().enumerate() {
            match self.decode_chunk(record) {
                Ok(chunk) => text.push_str(&chunk),
                Err(err) => {
                    log::error!("sjzip: chunk {ordinal} failed to decode: {err}");
                    return Err(err);
                }
            }
        }
        Ok(text)
    }

    /// Encode a whole document as an `SJZ1` byte stream.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        let records = self.encode_records(text)?;
        let body: usize = records.iter().map(DotRecord::encoded_len).sum();

        let mut out = Vec::with_capacity(FILE_HEADER_SIZE + body);
        out.put_slice(&MAGIC);
        out.put_u16(self.config.chunk_size);
        for record in &records {
            record.write_to(&mut out)?;
        }

        log::debug!(
            "sjzip: encoded {} bytes of text into {} chunks ({} bytes)",
            text.len(),
            records.len(),
            out.len()
        );
        Ok(out)
    }

    /// Parse an `SJZ1` byte stream into its records without decoding them.
    pub fn read_records(&self, data: &[u8]) -> Result<Vec<DotRecord>> {
        let max = self.config.max_encoded_size();
        if data.len() > max {
            return Err(SjzError::InputTooLarge {
                size: data.len(),
                max,
            });
        }

        let mut buf = data;
        read_magic(&mut buf, MAGIC)?;
        if buf.remaining() < 2 {
            return Err(SjzError::truncated("chunk size", 2, buf.remaining()));
        }
        let chunk_size = buf.get_u16();
        if chunk_size != self.config.chunk_size {
            return Err(SjzError::ChunkSizeMismatch {
                found: chunk_size,
                expected: self.config.chunk_size,
            });
        }

        let mut records = Vec::new();
        while buf.has_remaining() {
            if records.len() >= self.config.max_chunks {
                return Err(SjzError::TooManyChunks {
                    count: records.len() + 1,
                    max: self.config.max_chunks,
                });
            }
            let record = DotRecord::read_from(&mut buf, self.config.max_payload_size)
                .inspect_err(|err| {
                    log::error!("sjzip: chunk {} is malformed: {err}", records.len());
                })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Decode an `SJZ1` byte stream. Fails on the first bad record.
    pub fn decode(&self, data: &[u8]) -> Result<String> {
        let records = self.read_records(data)?;
        let text = self.decode_records(&records)?;
        log::debug!(
            "sjzip: decoded {} chunks into {} bytes of text",
            records.len(),
            text.len()
        );
        Ok(text)
    }
}
