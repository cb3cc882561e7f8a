// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use astrocodec::{
    CancelToken, CodecError, CollectingSink, Diagnostic, DiagnosticKind, Field, ParserConfig,
    RecordSink, TableReader,
};
use base64::Engine as _;

// ============================================================================
// Parsing
// ============================================================================

/// Outcome of one parse.
pub struct Parsed {
    pub sink: CollectingSink,
    pub reader: TableReader,
    pub result: Result<(), CodecError>,
}

impl Parsed {
    /// Diagnostics of `kind`.
    pub fn diagnostics(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.sink
            .diagnostics
            .iter()
            .filter(|d| d.kind == kind)
            .collect()
    }
}

/// Parse `bytes` with the default configuration and format detection.
pub fn parse_bytes(bytes: &[u8]) -> Parsed {
    parse_with(ParserConfig::default(), bytes)
}

pub fn parse_with(config: ParserConfig, bytes: &[u8]) -> Parsed {
    let mut reader = TableReader::new(config);
    let mut sink = CollectingSink::new();
    let result = reader.parse(bytes, &mut sink);
    Parsed {
        sink,
        reader,
        result,
    }
}

/// Parse a file on disk.
pub fn parse_file(path: &Path) -> Parsed {
    let mut reader = TableReader::new(ParserConfig::default());
    let mut sink = CollectingSink::new();
    let result = reader.parse_file(path, &mut sink);
    Parsed {
        sink,
        reader,
        result,
    }
}

/// Sink that interrupts the parse after `after` records.
pub struct StopAfter {
    pub inner: CollectingSink,
    token: CancelToken,
    after: usize,
}

impl StopAfter {
    pub fn new(token: CancelToken, after: usize) -> Self {
        Self {
            inner: CollectingSink::new(),
            token,
            after,
        }
    }
}

impl RecordSink for StopAfter {
    fn on_table_start(&mut self, name: Option<&str>) {
        self.inner.on_table_start(name);
    }

    fn on_field(&mut self, field: &Field) {
        self.inner.on_field(field);
    }

    fn on_record(&mut self, lon: Option<f64>, lat: Option<f64>, time_jd: Option<f64>, raw: &[String]) {
        self.inner.on_record(lon, lat, time_jd, raw);
        if self.inner.record_count() >= self.after {
            self.token.cancel();
        }
    }

    fn on_table_end(&mut self) {
        self.inner.on_table_end();
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.inner.on_diagnostic(diagnostic);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn assert_close(actual: Option<f64>, expected: f64, tolerance: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got None"));
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected} +/- {tolerance}, got {actual}"
    );
}

/// Wrap `body` in a VOTable document.
pub fn votable(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <VOTABLE version=\"1.4\" xmlns=\"http://www.ivoa.net/xml/VOTable/v1.3\">\n{body}\n</VOTABLE>\n"
    )
}

pub fn base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// FITS header block(s) from `(keyword, value)` pairs, END appended.
pub fn fits_header(cards: &[(&str, &str)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (key, value) in cards {
        out.extend(format!("{key:<8}= {value:<70}").into_bytes());
    }
    out.extend(format!("{:<80}", "END").into_bytes());
    pad_block(out, b' ')
}

pub fn pad_block(mut bytes: Vec<u8>, fill: u8) -> Vec<u8> {
    let padded = bytes.len().div_ceil(2880) * 2880;
    bytes.resize(padded, fill);
    bytes
}

pub fn fits_primary() -> Vec<u8> {
    fits_header(&[("SIMPLE", "T"), ("BITPIX", "8"), ("NAXIS", "0"), ("EXTEND", "T")])
}

/// BINTABLE extension; `columns` are `(TTYPE, TFORM, TUNIT)`.
pub fn fits_bintable(name: &str, columns: &[(&str, &str, &str)], row_bytes: usize, data: Vec<u8>) -> Vec<u8> {
    let rows = if row_bytes == 0 { 0 } else { data.len() / row_bytes };
    let quoted = |s: &str| format!("'{s}'");
    let mut cards: Vec<(String, String)> = vec![
        ("XTENSION".into(), quoted("BINTABLE")),
        ("BITPIX".into(), "8".into()),
        ("NAXIS".into(), "2".into()),
        ("NAXIS1".into(), row_bytes.to_string()),
        ("NAXIS2".into(), rows.to_string()),
        ("PCOUNT".into(), "0".into()),
        ("GCOUNT".into(), "1".into()),
        ("TFIELDS".into(), columns.len().to_string()),
        ("EXTNAME".into(), quoted(name)),
    ];
    for (index, (ttype, tform, tunit)) in columns.iter().enumerate() {
        let n = index + 1;
        cards.push((format!("TTYPE{n}"), quoted(*ttype)));
        cards.push((format!("TFORM{n}"), quoted(*tform)));
        if !tunit.is_empty() {
            cards.push((format!("TUNIT{n}"), quoted(*tunit)));
        }
    }
    let refs: Vec<(&str, &str)> = cards.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let mut out = fits_header(&refs);
    out.extend(pad_block(data, 0));
    out
}

/// Primary HDU followed by a BINTABLE of double RA/DEC rows.
pub fn fits_radec(rows: &[(f64, f64)]) -> Vec<u8> {
    let mut data = Vec::new();
    for (ra, dec) in rows {
        data.extend_from_slice(&ra.to_be_bytes());
        data.extend_from_slice(&dec.to_be_bytes());
    }
    let mut out = fits_primary();
    out.extend(fits_bintable(
        "SOURCES",
        &[("RA", "D", "deg"), ("DEC", "D", "deg")],
        16,
        data,
    ));
    out
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).expect("create fixture");
    file.write_all(bytes).expect("write fixture");
    path
}
