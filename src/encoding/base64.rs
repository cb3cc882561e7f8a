// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Incremental base64 decoding for inline `<STREAM encoding="base64">` data.
//!
//! Character data arrives from the XML tokenizer in arbitrary pieces. Only
//! whole 4-character quanta are decoded; the remainder is carried to the
//! next call.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::{CodecError, Result};

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base64 decoder that tolerates quanta split across calls.
#[derive(Debug, Default, Clone)]
pub struct Base64StreamDecoder {
    pending: Vec<u8>,
}

impl Base64StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode all complete quanta of `text`, keeping the undecoded remainder.
    pub fn feed(&mut self, text: &str) -> Result<Vec<u8>> {
        self.pending
            .extend(text.bytes().filter(|b| !b.is_ascii_whitespace()));

        // Padding marks the end of a quantum group; decode through it.
        let complete = match self.pending.iter().rposition(|&b| b == b'=') {
            Some(pad) if (pad + 1) % 4 == 0 => pad + 1,
            _ => self.pending.len() - self.pending.len() % 4,
        };
        if complete == 0 {
            return Ok(Vec::new());
        }
        let decoded = decode_quanta(&self.pending[..complete])?;
        self.pending.drain(..complete);
        Ok(decoded)
    }

    /// Decode whatever is left at the end of the stream.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let rest = std::mem::take(&mut self.pending);
        decode_quanta(&rest)
    }

    /// Characters waiting for the rest of their quantum.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

fn decode_quanta(input: &[u8]) -> Result<Vec<u8>> {
    match ENGINE.decode(input) {
        Ok(bytes) => Ok(bytes),
        // Concatenated padded blocks: decode quantum by quantum.
        Err(_) => {
            let mut out = Vec::with_capacity(input.len() / 4 * 3);
            for quantum in input.chunks(4) {
                let bytes = ENGINE
                    .decode(quantum)
                    .map_err(|e| CodecError::parse("base64 STREAM", e.to_string()))?;
                out.extend_from_slice(&bytes);
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_quanta() {
        // "Hello, world" = SGVsbG8sIHdvcmxk
        let mut decoder = Base64StreamDecoder::new();
        let mut out = decoder.feed("SGVsb").unwrap();
        assert_eq!(decoder.pending(), b"b");
        out.extend(decoder.feed("G8sI\n  Hdvc").unwrap());
        out.extend(decoder.feed("mxk").unwrap());
        out.extend(decoder.finish().unwrap());
        assert_eq!(out, b"Hello, world");
    }

    #[test]
    fn test_padding_and_tail() {
        let mut decoder = Base64StreamDecoder::new();
        let mut out = decoder.feed("QUJD").unwrap();
        out.extend(decoder.feed("RA==").unwrap());
        assert!(decoder.pending().is_empty());
        assert_eq!(out, b"ABCD");
    }

    #[test]
    fn test_invalid_characters() {
        let mut decoder = Base64StreamDecoder::new();
        assert!(decoder.feed("@@@@").is_err());
    }
}
