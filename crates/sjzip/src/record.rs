//! `SJZ1` chunk record framing.
//!
//! ```text
//! offset  size  field
//! 0       2     front_index   (u16, big-endian)
//! 2       2     length        (u16)
//! 4       32    x, y, z, t    (f64 each)
//! 36      4     payload_len   (u32)
//! 40      n     payload
//! ```

use bytes::{Buf, BufMut};

use crate::alphabet::Alphabet;
use crate::error::{Result, SjzError};
use crate::spiral::SpiralCoordinate;

/// Size of the fixed part of a record.
pub const RECORD_HEADER_SIZE: usize = 2 + 2 + 4 * 8 + 4;

/// One encoded chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct DotRecord {
    pub front_index: u16,
    pub length: u16,
    /// Spiral coordinate of the chunk's last character.
    pub coordinate: SpiralCoordinate,
    pub payload: Vec<u8>,
}

impl DotRecord {
    pub fn front_char(&self) -> Option<char> {
        Alphabet::get().char_at(usize::from(self.front_index))
    }

    /// Total size of the record on the wire.
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_SIZE + self.payload.len()
    }

    /// Check the numeric fields against the alphabet and `chunk_size`.
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
        if self.payload.is_empty() {
            return Err(SjzError::EmptyPayload);
        }
        self.coordinate.ensure_normalized()
    }

    pub fn write_to<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        let payload_len = u32::try_from(self.payload.len()).map_err(|_| {
            SjzError::PayloadTooLarge {
                size: self.payload.len(),
                max: u32::MAX as usize,
            }
        })?;

        buf.put_u16(self.front_index);
        buf.put_u16(self.length);
        buf.put_f64(self.coordinate.x);
        buf.put_f64(self.coordinate.y);
        buf.put_f64(self.coordinate.z);
        buf.put_f64(self.coordinate.t);
        buf.put_u32(payload_len);
        buf.put_slice(&self.payload);
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Read one record from the front of `buf`, advancing it past the record.
    ///
    /// The declared payload length is checked against `max_payload_size` before
    /// anything is copied.
    pub fn read_from<B: Buf>(buf: &mut B, max_payload_size: usize) -> Result<Self> {
        if buf.remaining() < RECORD_HEADER_SIZE {
            return Err(SjzError::truncated(
                "record header",
                RECORD_HEADER_SIZE,
                buf.remaining(),
            ));
        }

        let front_index = buf.get_u16();
        let length = buf.get_u16();
        let coordinate = SpiralCoordinate {
            x: buf.get_f64(),
            y: buf.get_f64(),
            z: buf.get_f64(),
            t: buf.get_f64(),
        };
        let payload_len = buf.get_u32() as usize;

        if payload_len > max_payload_size {
            return Err(SjzError::PayloadTooLarge {
                size: payload_len,
                max: max_payload_size,
            });
        }
        if buf.remaining() < payload_len {
            return Err(SjzError::truncated(
                "record payload",
                payload_len,
                buf.remaining(),
            ));
        }

        let mut payload = vec![0u8; payload_len];
        buf.copy_to_slice(&mut payload);

        Ok(Self {
            front_index,
            length,
            coordinate,
            payload,
        })
    }
}
