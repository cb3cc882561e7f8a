// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Astrocodec
//!
//! Streaming reader for astronomical tables.
//!
//! Tables are read from VOTable or Astrores XML (TABLEDATA, BINARY,
//! BINARY2, CSV and FITS serialisations), plain CSV/TSV text, and FITS
//! ASCII or binary table extensions. For every record the reader reports
//! the raw cells together with a position converted to ICRS degrees and a
//! time converted to a TCB Julian date, when the table has them.
//!
//! ## Architecture
//!
//! - `core/` - Errors, diagnostics, field descriptors, configuration
//! - `encoding/` - Byte codecs for binary and ASCII cells, base64
//! - `astro/` - Column role scoring, angle parsing, frame and time conversion
//! - `io/formats/` - VOTable, CSV and FITS parsers
//! - `io/` - Session, sinks, stream fetching, format detection, [`TableReader`]
//!
//! ## Example
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use astrocodec::{CollectingSink, ParserConfig, TableReader};
//!
//! let mut reader = TableReader::new(ParserConfig::default());
//! let mut sink = CollectingSink::new();
//! reader.parse_file("sources.fits", &mut sink)?;
//! for table in &sink.tables {
//!     println!("{}: {} records", table.name.as_deref().unwrap_or("-"), table.records.len());
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{
    ArraySize, CodecError, CsvConfig, DataType, Diagnostic, DiagnosticKind, Field, ParserConfig,
    Result, Role, Severity, TableFormat, MISSING_CELL,
};

// Byte codecs
pub mod encoding;

// Roles, frames and times
pub mod astro;

// Parsers, sessions and sinks
pub mod io;

pub use io::{
    detect_format, CancelToken, CollectedRecord, CollectedTable, CollectingSink, FileFetcher,
    RecordSink, StreamFetcher, TableReader,
};
