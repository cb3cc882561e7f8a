// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! FITS header access.
//!
//! A header is a sequence of 80-byte ASCII cards packed into 2880-byte
//! blocks and terminated by an `END` card. Value cards have `= ` in columns
//! 9-10; string values are single-quoted with `''` as an escaped quote.

use std::collections::HashMap;
use std::io::Read;

use crate::{CodecError, Result};

/// Size of a FITS logical record.
pub const BLOCK_SIZE: usize = 2880;

/// Size of one header card.
pub const CARD_SIZE: usize = 80;

/// Keyword lookup on a FITS header.
///
/// Absent keywords fail with [`CodecError::KeyNotFound`]; the provided
/// helpers turn that into a default.
pub trait HeaderAccessor {
    fn get_int(&self, key: &str) -> Result<i64>;

    fn get_double(&self, key: &str) -> Result<f64>;

    fn get_string(&self, key: &str) -> Result<String>;

    /// Integer keyword, `default` when absent. Unparsable values still fail.
    fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.get_int(key) {
            Err(CodecError::KeyNotFound { .. }) => Ok(default),
            other => other,
        }
    }

    /// Floating point keyword, `default` when absent.
    fn double_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get_double(key) {
            Err(CodecError::KeyNotFound { .. }) => Ok(default),
            other => other,
        }
    }

    /// String keyword, `None` when absent or blank.
    fn opt_string(&self, key: &str) -> Option<String> {
        self.get_string(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

/// Header parsed from raw cards.
#[derive(Debug, Clone, Default)]
pub struct CardHeader {
    values: HashMap<String, String>,
    keys: Vec<String>,
    /// Bytes occupied by the header, padding included
    byte_len: usize,
}

impl CardHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one header from `reader`, block by block, up to its `END` card.
    ///
    /// Returns `None` on a clean end of file before the first block.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Self>> {
        let mut header = CardHeader::new();
        let mut block = [0u8; BLOCK_SIZE];
        loop {
            let filled = read_full(reader, &mut block)?;
            if filled == 0 && header.byte_len == 0 {
                return Ok(None);
            }
            if filled < BLOCK_SIZE {
                return Err(CodecError::format(
                    "FITS header",
                    format!("truncated header block ({filled} of {BLOCK_SIZE} bytes)"),
                ));
            }
            header.byte_len += BLOCK_SIZE;
            if header.push_block(&block)? {
                return Ok(Some(header));
            }
        }
    }

    /// Parse a header from a byte slice holding whole blocks.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut header = CardHeader::new();
        for block in bytes.chunks(BLOCK_SIZE) {
            header.byte_len += BLOCK_SIZE;
            if header.push_block(block)? {
                return Ok(header);
            }
        }
        Err(CodecError::format("FITS header", "missing END card"))
    }

    /// Add the cards of one block. Returns `true` once `END` was seen.
    fn push_block(&mut self, block: &[u8]) -> Result<bool> {
        for card in block.chunks(CARD_SIZE) {
            let card = String::from_utf8_lossy(card);
            let keyword = card.get(..8.min(card.len())).unwrap_or("").trim_end();
            if keyword == "END" {
                return Ok(true);
            }
            if keyword.is_empty() || card.get(8..10) != Some("= ") {
                continue;
            }
            let value = parse_value(card.get(10..).unwrap_or(""));
            if !self.values.contains_key(keyword) {
                self.keys.push(keyword.to_string());
            }
            self.values.insert(keyword.to_string(), value);
        }
        Ok(false)
    }

    /// Bytes the header occupies in the file.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keywords in card order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    fn raw(&self, key: &str) -> Result<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| CodecError::key_not_found(key))
    }
}

impl HeaderAccessor for CardHeader {
    fn get_int(&self, key: &str) -> Result<i64> {
        let raw = self.raw(key)?;
        if let Ok(value) = raw.parse::<i64>() {
            return Ok(value);
        }
        match parse_number(raw) {
            Some(value) if value.fract() == 0.0 => Ok(value as i64),
            _ => Err(CodecError::parse(
                format!("FITS keyword {key}"),
                format!("'{raw}' is not an integer"),
            )),
        }
    }

    fn get_double(&self, key: &str) -> Result<f64> {
        let raw = self.raw(key)?;
        parse_number(raw).ok_or_else(|| {
            CodecError::parse(
                format!("FITS keyword {key}"),
                format!("'{raw}' is not a number"),
            )
        })
    }

    fn get_string(&self, key: &str) -> Result<String> {
        self.raw(key).map(str::to_string)
    }
}

/// Fill `buf` from `reader`, returning fewer bytes only at end of file.
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().replace(['D', 'd'], "E").parse().ok()
}

/// Value field of a card (columns 11-80): a quoted string, or the text
/// before the `/` comment.
fn parse_value(field: &str) -> String {
    let field = field.trim_start();
    let Some(body) = field.strip_prefix('\'') else {
        return field.split('/').next().unwrap_or("").trim().to_string();
    };
    let mut value = String::new();
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                value.push('\'');
                continue;
            }
            break;
        }
        value.push(ch);
    }
    value.trim_end().to_string()
}
