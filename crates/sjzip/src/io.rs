//! Reader, writer and file helpers shared by both container formats.

use std::io::{Read, Write};
use std::path::Path;

use crate::codec::SjzCodec;
use crate::error::{Result, SjzError};

/// A whole-document codec with a size ceiling on its encoded form.
pub trait TextCodec {
    /// Conventional file extension, without the dot.
    const EXTENSION: &'static str;

    fn encode(&self, text: &str) -> Result<Vec<u8>>;
    fn decode(&self, data: &[u8]) -> Result<String>;

    /// Largest encoded input `decode` accepts.
    fn max_input_size(&self) -> usize;
}

impl TextCodec for SjzCodec {
    const EXTENSION: &'static str = "sjz";

    fn encode(&self, text: &str) -> Result<Vec<u8>> {
        SjzCodec::encode(self, text)
    }

    fn decode(&self, data: &[u8]) -> Result<String> {
        SjzCodec::decode(self, data)
    }

    fn max_input_size(&self) -> usize {
        self.config().max_encoded_size()
    }
}

pub fn encode_to_writer<C: TextCodec, W: Write>(
    codec: &C,
    text: &str,
    mut writer: W,
) -> Result<usize> {
    let bytes = codec.encode(text)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(bytes.len())
}

/// Read at most `max_input_size` bytes from `reader` and decode them.
pub fn decode_from_reader<C: TextCodec, R: Read>(codec: &C, reader: R) -> Result<String> {
    let max = codec.max_input_size();
    let mut data = Vec::new();
    reader
        .take((max as u64).saturating_add(1))
        .read_to_end(&mut data)?;
    if data.len() > max {
        return Err(SjzError::InputTooLarge {
            size: data.len(),
            max,
        });
    }
    codec.decode(&data)
}

pub fn encode_to_file<C: TextCodec>(codec: &C, text: &str, path: &Path) -> Result<usize> {
    warn_on_extension::<C>(path);
    let bytes = codec.encode(text)?;
    std::fs::write(path, &bytes)?;
    log::info!(
        "sjzip: wrote {} ({} bytes of text -> {} bytes)",
        path.display(),
        text.len(),
        bytes.len()
    );
    Ok(bytes.len())
}

/// Decode a file, checking its size before reading it.
pub fn decode_from_file<C: TextCodec>(codec: &C, path: &Path) -> Result<String> {
    warn_on_extension::<C>(path);
    let size = std::fs::metadata(path)?.len();
    let max = codec.max_input_size();
    if size > max as u64 {
        return Err(SjzError::InputTooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            max,
        });
    }

    let data = std::fs::read(path)?;
    let text = codec.decode(&data)?;
    log::info!(
        "sjzip: decoded {} ({} bytes -> {} bytes of text)",
        path.display(),
        data.len(),
        text.len()
    );
    Ok(text)
}

fn warn_on_extension<C: TextCodec>(path: &Path) {
    let matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(C::EXTENSION));
    if !matches {
        log::warn!(
            "sjzip: {} does not have the .{} extension",
            path.display(),
            C::EXTENSION
        );
    }
}
