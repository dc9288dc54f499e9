//! Error types for the sjzip codec.
//!
//! Every failure is fail-fast: the first invalid character, malformed header or
//! corrupted payload aborts the whole call. [`SjzError::kind`] groups the
//! variants into the four families callers usually branch on.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SjzError>;

/// Coarse classification of an [`SjzError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input rejected before any transform ran.
    Validation,
    /// Byte stream or exchange value does not follow the container layout.
    Format,
    /// A configured ceiling was exceeded.
    Overflow,
    /// Payload decoded to something no encoder could have produced.
    Corruption,
    /// Underlying reader, writer or filesystem failure.
    Io,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SjzError {
    // === Validation ===
    #[error("Unsupported character: {}", char_repr(.ch))]
    UnsupportedCharacter { ch: char },

    #[error("Unsupported character {} at position {position}", char_repr(.ch))]
    UnsupportedCharacterAt { ch: char, position: usize },

    #[error("Expected single character, got string of length {len}")]
    NotSingleCharacter { len: usize },

    #[error("Text cannot be empty")]
    EmptyText,

    #[error("Text exceeds maximum length: {len} > {max}")]
    TextTooLong { len: usize, max: usize },

    #[error("Payload cannot be empty")]
    EmptyPayload,

    #[error("Invalid digit {digit}, must be in [0, {base})")]
    InvalidDigit { digit: u32, base: u32 },

    #[error("Field `{field}` out of range: {detail}")]
    FieldOutOfRange { field: &'static str, detail: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Optimization level must be 0-3, got {0}")]
    InvalidLevel(u8),

    // === Format ===
    #[error("Invalid magic bytes: expected {expected:?}, got {found:?}")]
    InvalidMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("Truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Unsupported chunk size {found}, codec is configured for {expected}")]
    ChunkSizeMismatch { found: u16, expected: u16 },

    #[error("Unsupported optimization level {0} in header")]
    UnsupportedLevel(u8),

    #[error("{0} unexpected trailing bytes after the last record")]
    TrailingData(usize),

    #[error("Size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Unsupported schema version {found}, expected {expected}")]
    UnsupportedSchemaVersion { found: u64, expected: u32 },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid hex payload: {0}")]
    InvalidHex(String),

    // === Overflow ===
    #[error("Input too large: {size} bytes exceeds maximum of {max} bytes")]
    InputTooLarge { size: usize, max: usize },

    #[error("Payload exceeds maximum size: {size} > {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Value overflow in payload encoding: more than {max_bytes} bytes required")]
    ValueOverflow { max_bytes: usize },

    #[error("Too many chunks: {count} exceeds maximum of {max}")]
    TooManyChunks { count: usize, max: usize },

    #[error("Too many coordinates: {count} > {max}")]
    TooManyCoordinates { count: usize, max: usize },

    #[error("Declared original length {declared} exceeds maximum of {max}")]
    DeclaredLengthTooLarge { declared: usize, max: usize },

    // === Corruption ===
    #[error("Payload contained excess data beyond expected length {expected_digits}")]
    NonZeroRemainder { expected_digits: usize },

    #[error("Payload is not minimally encoded ({leading_zeros} leading zero bytes)")]
    NonCanonicalPayload { leading_zeros: usize },

    #[error("Decoded digit {digit} outside front order of size {base}")]
    DigitOutOfRange { digit: u32, base: u32 },

    #[error("Decoded chunk starts with {}, record front is {}", char_repr(.found), char_repr(.expected))]
    FrontMismatch { expected: char, found: char },

    // === I/O ===
    #[error("IO error: {0}")]
    Io(String),
}

impl SjzError {
    /// Which of the error families this belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SjzError::UnsupportedCharacter { .. }
            | SjzError::UnsupportedCharacterAt { .. }
            | SjzError::NotSingleCharacter { .. }
            | SjzError::EmptyText
            | SjzError::TextTooLong { .. }
            | SjzError::EmptyPayload
            | SjzError::InvalidDigit { .. }
            | SjzError::FieldOutOfRange { .. }
            | SjzError::InvalidConfig(_)
            | SjzError::InvalidLevel(_) => ErrorKind::Validation,

            SjzError::InvalidMagic { .. }
            | SjzError::Truncated { .. }
            | SjzError::ChunkSizeMismatch { .. }
            | SjzError::UnsupportedLevel(_)
            | SjzError::TrailingData(_)
            | SjzError::SizeMismatch { .. }
            | SjzError::MissingFields(_)
            | SjzError::UnsupportedSchemaVersion { .. }
            | SjzError::Schema(_)
            | SjzError::InvalidHex(_) => ErrorKind::Format,

            SjzError::InputTooLarge { .. }
            | SjzError::PayloadTooLarge { .. }
            | SjzError::ValueOverflow { .. }
            | SjzError::TooManyChunks { .. }
            | SjzError::TooManyCoordinates { .. }
            | SjzError::DeclaredLengthTooLarge { .. } => ErrorKind::Overflow,

            SjzError::NonZeroRemainder { .. }
            | SjzError::NonCanonicalPayload { .. }
            | SjzError::DigitOutOfRange { .. }
            | SjzError::FrontMismatch { .. } => ErrorKind::Corruption,

            SjzError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn field_out_of_range(field: &'static str, detail: impl Into<String>) -> Self {
        SjzError::FieldOutOfRange {
            field,
            detail: detail.into(),
        }
    }

    pub fn truncated(what: &'static str, needed: usize, available: usize) -> Self {
        SjzError::Truncated {
            what,
            needed,
            available,
        }
    }

    /// Position of the offending character, when the error points at one.
    pub fn position(&self) -> Option<usize> {
        match self {
            SjzError::UnsupportedCharacterAt { position, .. } => Some(*position),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SjzError {
    fn from(err: std::io::Error) -> Self {
        SjzError::Io(err.to_string())
    }
}

/// Render a character for an error message without leaking raw control bytes.
fn char_repr(ch: &char) -> String {
    if ch.is_ascii() {
        format!("{ch:?}")
    } else {
        format!("U+{:04X}", u32::from(*ch))
    }
}
