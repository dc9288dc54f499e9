//! Dots: the text-friendly exchange form of an encoded chunk.
//!
//! A [`DotPacket`] carries the same information as a [`DotRecord`] but
//! converts to and from a versioned JSON object:
//!
//! ```json
//! {
//!   "version": 1,
//!   "front_char": "A",
//!   "front_index": 34,
//!   "length": 5,
//!   "coordinates": { "x": 0.51, "y": 0.5, "z": 0.5, "t": 0.0 },
//!   "payload_hex": "03b5..."
//! }
//! ```
//!
//! `front_index`, `length` and `payload_hex` are required. `version` defaults
//! to 1, `coordinates` (per axis) to the spiral axis, and `front_char` when present must
//! name the same symbol as `front_index`.

use serde::Deserialize;
use serde_json::Value;

use crate::alphabet::Alphabet;
use crate::codec::SjzCodec;
use crate::config::CodecConfig;
use crate::error::{Result, SjzError};
use crate::mixed_radix::DigitPolicy;
use crate::record::DotRecord;
use crate::spiral::{SpiralCoordinate, SpiralMapper};

/// Current exchange schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Fields every exchange object must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["front_index", "length", "payload_hex"];

/// Coordinates assumed when an exchange object omits them.
pub const DEFAULT_COORDINATE: SpiralCoordinate = SpiralCoordinate {
    x: 0.5,
    y: 0.5,
    z: 0.5,
    t: 0.0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DotPacket {
    pub front_char: char,
    pub front_index: u16,
    /// Character count. Not capped by the chunk size for single-dot packets.
    pub length: u32,
    pub coordinate: SpiralCoordinate,
    pub payload: Vec<u8>,
}

/// Loosely typed view of an exchange object, before field checks.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DotPacketWire {
    version: Option<u64>,
    front_char: Option<String>,
    front_index: Option<u64>,
    length: Option<u64>,
    coordinates: Option<CoordinateWire>,
    payload_hex: Option<String>,
}

/// Exchange coordinates; each missing axis falls back on its own.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct CoordinateWire {
    x: f64,
    y: f64,
    z: f64,
    t: f64,
}

impl Default for CoordinateWire {
    fn default() -> Self {
        let SpiralCoordinate { x, y, z, t } = DEFAULT_COORDINATE;
        Self { x, y, z, t }
    }
}

impl From<CoordinateWire> for SpiralCoordinate {
    fn from(CoordinateWire { x, y, z, t }: CoordinateWire) -> Self {
        SpiralCoordinate::new(x, y, z, t)
    }
}

impl DotPacket {
    pub fn from_record(record: &DotRecord) -> Result<Self> {
        let front_char = record.front_char().ok_or_else(|| {
            SjzError::field_out_of_range("front_index", record.front_index.to_string())
        })?;
        Ok(Self {
            front_char,
            front_index: record.front_index,
            length: u32::from(record.length),
            coordinate: record.coordinate,
            payload: record.payload.clone(),
        })
    }

    /// Back to a record. Fails if `length` does not fit a record.
    pub fn to_record(&self) -> Result<DotRecord> {
        let length = u16::try_from(self.length).map_err(|_| {
            SjzError::field_out_of_range("length", format!("{} > {}", self.length, u16::MAX))
        })?;
        Ok(DotRecord {
            front_index: self.front_index,
            length,
            coordinate: self.coordinate,
            payload: self.payload.clone(),
        })
    }

    pub fn payload_hex(&self) -> String {
        hex::encode(&self.payload)
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "version": SCHEMA_VERSION,
            "front_char": self.front_char.to_string(),
            "front_index": self.front_index,
            "length": self.length,
            "coordinates": self.coordinate.rounded(),
            "payload_hex": self.payload_hex(),
        })
    }

    /// Typed decode of an exchange object.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(SjzError::Schema(format!(
                "expected an object, got {}",
                json_type_name(value)
            )));
        };

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| fields.get(*field).is_none_or(Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(SjzError::MissingFields(missing));
        }

        let wire = DotPacketWire::deserialize(value)
            .map_err(|err| SjzError::Schema(err.to_string()))?;

        let version = wire.version.unwrap_or(u64::from(SCHEMA_VERSION));
        if version != u64::from(SCHEMA_VERSION) {
            return Err(SjzError::UnsupportedSchemaVersion {
                found: version,
                expected: SCHEMA_VERSION,
            });
        }

        let alphabet = Alphabet::get();
        let front_index = wire.front_index.unwrap_or_default();
        let front_char = usize::try_from(front_index)
            .ok()
            .and_then(|index| alphabet.char_at(index))
            .ok_or_else(|| {
                SjzError::field_out_of_range(
                    "front_index",
                    format!("{front_index} >= {}", alphabet.len()),
                )
            })?;

        if let Some(declared) = wire.front_char.as_deref() {
            let declared = alphabet.ensure_single(declared)?;
            if declared != front_char {
                return Err(SjzError::Schema(format!(
                    "front_char {declared:?} disagrees with front_index {front_index} ({front_char:?})"
                )));
            }
        }

        let length = wire.length.unwrap_or_default();
        let length = u32::try_from(length)
            .ok()
            .filter(|length| *length > 0)
            .ok_or_else(|| {
                SjzError::field_out_of_range("length", format!("{length} not in [1, {}]", u32::MAX))
            })?;

        let coordinate = wire
            .coordinates
            .map_or(DEFAULT_COORDINATE, SpiralCoordinate::from);
        coordinate.ensure_normalized()?;

        let payload = hex::decode(wire.payload_hex.unwrap_or_default())
            .map_err(|err| SjzError::InvalidHex(err.to_string()))?;
        if payload.is_empty() {
            return Err(SjzError::EmptyPayload);
        }

        Ok(Self {
            front_char,
            front_index: front_index as u16,
            length,
            coordinate,
            payload,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.to_value()).map_err(|err| SjzError::Schema(err.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|err| SjzError::Schema(err.to_string()))?;
        Self::from_value(&value)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Text <-> dot packet transforms on top of [`SjzCodec`].
#[derive(Debug, Clone, Default)]
pub struct DotCodec {
    codec: SjzCodec,
}

impl DotCodec {
    pub fn new(config: CodecConfig) -> Result<Self> {
        Ok(Self {
            codec: SjzCodec::new(config)?,
        })
    }

    pub fn codec(&self) -> &SjzCodec {
        &self.codec
    }

    /// One packet per chunk.
    pub fn text_to_dots(&self, text: &str) -> Result<Vec<DotPacket>> {
        self.codec
            .encode_records(text)?
            .iter()
            .map(DotPacket::from_record)
            .collect()
    }

    pub fn dots_to_text(&self, dots: &[DotPacket]) -> Result<String> {
        let records = dots
            .iter()
            .map(DotPacket::to_record)
            .collect::<Result<Vec<_>>>()?;
        self.codec.decode_records(&records)
    }

    pub fn dots_to_values(&self, dots: &[DotPacket]) -> Vec<Value> {
        dots.iter().map(DotPacket::to_value).collect()
    }

    pub fn dots_from_values(&self, values: &[Value]) -> Result<Vec<DotPacket>> {
        values.iter().map(DotPacket::from_value).collect()
    }

    /// Encode a whole text as a single packet.
    ///
    /// The length is bounded by the document ceiling rather than the chunk
    /// size; the payload by `max_payload_size`.
    pub fn text_to_single_dot(&self, text: &str) -> Result<DotPacket> {
        let len = self.codec.validate_document(text)?;
        if len == 0 {
            return Err(SjzError::EmptyText);
        }

        let (front_index, length, payload) = self.codec.radix().encode(text)?;
        let length = u32::try_from(length)
            .map_err(|_| SjzError::TextTooLong { len: length, max: u32::MAX as usize })?;
        let last = text.chars().next_back().ok_or(SjzError::EmptyText)?;
        let front_char = text.chars().next().ok_or(SjzError::EmptyText)?;

        Ok(DotPacket {
            front_char,
            front_index,
            length,
            coordinate: SpiralMapper::get().coordinate(last)?,
            payload,
        })
    }

    pub fn single_dot_to_text(&self, dot: &DotPacket) -> Result<String> {
        let max = self.codec.config().max_text_size;
        if dot.length as usize > max {
            return Err(SjzError::DeclaredLengthTooLarge {
                declared: dot.length as usize,
                max,
            });
        }
        self.codec.radix().decode(
            dot.front_index,
            dot.length as usize,
            &dot.payload,
            DigitPolicy::Strict,
        )
    }
}
