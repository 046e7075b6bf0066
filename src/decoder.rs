//! Coinbase Script Decoder
//!
//! Decodes the hex-encoded coinbase input script into three views:
//! UTF-8 text, printable ASCII, and canonical lowercase hex.
//! Malformed hex is reported as a `DecodeError`, never as a panic.

use thiserror::Error;

/// Replacement for bytes outside the printable ASCII range
pub const PLACEHOLDER: char = '.';

/// Errors that can occur while decoding a single script
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Odd-length hex string ({0} digits)")]
    OddLength(usize),

    #[error("Invalid hex character {c:?} at position {index}")]
    InvalidHexCharacter { c: char, index: usize },
}

/// The three derived views of a coinbase script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedScript {
    /// Bytes as UTF-8, or the ASCII view when they are not valid UTF-8
    pub utf8: String,
    /// Printable ASCII with `PLACEHOLDER` for every other byte
    pub ascii: String,
    /// Lowercase hex of the bytes
    pub hex: String,
}

impl DecodedScript {
    /// Build all three views from raw script bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            utf8: bytes_to_utf8(bytes),
            ascii: bytes_to_ascii(bytes),
            hex: hex::encode(bytes),
        }
    }
}

/// Trim whitespace and strip an optional `0x` prefix
pub fn strip_hex_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
}

/// Parse a hex string to bytes (with or without 0x prefix)
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>, DecodeError> {
    let digits = strip_hex_prefix(hex_str);
    hex::decode(digits).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => {
            DecodeError::InvalidHexCharacter { c, index }
        }
        hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
            DecodeError::OddLength(digits.len())
        }
    })
}

/// Map each byte to itself if printable ASCII (0x20..=0x7E), else `PLACEHOLDER`
pub fn bytes_to_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (0x20..0x7f).contains(&b) { b as char } else { PLACEHOLDER })
        .collect()
}

/// Interpret bytes as UTF-8, falling back to the ASCII view when invalid
pub fn bytes_to_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes_to_ascii(bytes),
    }
}

/// Decode a hex-encoded coinbase script.
///
/// An empty script decodes to three empty strings.
///
/// # Arguments
/// * `input_script` - Hex digits, optionally `0x`-prefixed, any case
///
/// # Returns
/// The decoded views, or the reason the hex could not be parsed
pub fn decode_script(input_script: &str) -> Result<DecodedScript, DecodeError> {
    let bytes = hex_to_bytes(input_script)?;
    Ok(DecodedScript::from_bytes(&bytes))
}
