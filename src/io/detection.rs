// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format detection using file signatures and extensions.
//!
//! # Supported Formats
//!
//! - **FITS**: the first card starts with `SIMPLE  =`
//! - **XML**: `<?xml`, `<VOTABLE` or `<ASTRO` after an optional BOM and
//!   leading whitespace or comments
//! - **CSV/TSV**: any other text
//!
//! # Example
//!
//! ```rust,no_run
//! use astrocodec::io::detection::detect_format;
//! use astrocodec::TableFormat;
//!
//! let format = detect_format("catalog.vot")?;
//! assert_eq!(format, TableFormat::Xml);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::core::TableFormat;
use crate::CodecError;

/// Bytes inspected by signature detection.
pub const SNIFF_LEN: usize = 1024;

const FITS_SIGNATURE: &[u8] = b"SIMPLE  =";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Detect the format of a file from its content, falling back to its
/// extension when the content is inconclusive or unreadable.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Result<TableFormat, CodecError> {
    let path_ref = path.as_ref();

    match detect_from_magic(path_ref) {
        Ok(TableFormat::Unknown) | Err(_) => {}
        Ok(format) => return Ok(format),
    }
    Ok(detect_from_extension(path_ref))
}

fn detect_from_magic(path: &Path) -> Result<TableFormat, CodecError> {
    let mut file = File::open(path)?;
    let mut head = [0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < head.len() {
        let n = file.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(detect_from_bytes(&head[..filled]))
}

/// Detect the format of a stream from its first bytes.
///
/// Empty or binary input is `Unknown`; any other text is taken as CSV.
pub fn detect_from_bytes(head: &[u8]) -> TableFormat {
    if head.starts_with(FITS_SIGNATURE) {
        return TableFormat::Fits;
    }
    let text = head.strip_prefix(UTF8_BOM).unwrap_or(head);
    let text = skip_whitespace(text);
    if text.is_empty() {
        return TableFormat::Unknown;
    }
    if is_xml_start(text) {
        return TableFormat::Xml;
    }
    if looks_like_text(text) {
        return TableFormat::Csv;
    }
    TableFormat::Unknown
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn is_xml_start(text: &[u8]) -> bool {
    let mut text = text;
    // Leading comments may precede the root element.
    while let Some(rest) = text.strip_prefix(b"<!--") {
        match rest.windows(3).position(|w| w == b"-->") {
            Some(end) => text = skip_whitespace(&rest[end + 3..]),
            None => return true,
        }
    }
    [&b"<?xml"[..], b"<VOTABLE", b"<ASTRO", b"<!DOCTYPE"]
        .iter()
        .any(|sig| text.len() >= sig.len() && text[..sig.len()].eq_ignore_ascii_case(sig))
        || starts_with_prefixed_votable(text)
}

/// `<vot:VOTABLE`-style roots.
fn starts_with_prefixed_votable(text: &[u8]) -> bool {
    let Some(rest) = text.strip_prefix(b"<") else {
        return false;
    };
    let name_end = rest
        .iter()
        .position(|b| b.is_ascii_whitespace() || *b == b'>')
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    name.iter().any(|b| *b == b':') && name.ends_with(b"VOTABLE")
}

fn looks_like_text(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    let control = sample
        .iter()
        .filter(|b| b.is_ascii_control() && !b.is_ascii_whitespace())
        .count();
    control * 20 < sample.len().max(1)
}

/// Detect format from file extension.
pub fn detect_from_extension(path: &Path) -> TableFormat {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| match ext.to_lowercase().as_str() {
            "vot" | "votable" | "xml" => TableFormat::Xml,
            "fits" | "fit" | "fts" => TableFormat::Fits,
            "csv" | "tsv" | "tab" | "txt" => TableFormat::Csv,
            _ => TableFormat::Unknown,
        })
        .unwrap_or(TableFormat::Unknown)
}

/// Pick field separators for a CSV/TSV sample: tab when the first line
/// has one, else comma, else `|`, else whitespace.
pub fn sniff_separators(head: &[u8]) -> &'static str {
    let text = String::from_utf8_lossy(head);
    let line = text
        .lines()
        .find(|l| !l.trim().is_empty() && !l.starts_with('#'))
        .unwrap_or("");
    if line.contains('\t') {
        "\t"
    } else if line.contains(',') {
        ","
    } else if line.contains('|') {
        "|"
    } else if line.contains(';') {
        ";"
    } else {
        " "
    }
}

/// Format detector.
///
/// This trait can be implemented for custom format detection logic.
pub trait FormatDetector: Send + Sync {
    /// Detect the format of a file.
    fn detect(&self, path: &Path) -> Result<TableFormat, CodecError>;
}

/// Default format detector implementation.
#[derive(Debug, Clone, Copy)]
pub struct DefaultFormatDetector;

impl FormatDetector for DefaultFormatDetector {
    fn detect(&self, path: &Path) -> Result<TableFormat, CodecError> {
        detect_format(path)
    }
}

/// Check if a file is likely a FITS file.
pub fn is_fits_file<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_format(path), Ok(TableFormat::Fits))
}

/// Check if a file is likely a VOTable or Astrores document.
pub fn is_xml_file<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_format(path), Ok(TableFormat::Xml))
}
