// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout astrocodec.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Terminating errors
//! - [`Diagnostic`] - Non-fatal conditions reported to the sink
//! - [`Field`] - Column descriptors
//! - [`ParserConfig`] - Configuration shared by all format paths
//! - [`TableFormat`] - Input format identifier

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod field;

pub use config::{CsvConfig, ParserConfig};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use error::{CodecError, Result};
pub use field::{ArraySize, DataType, Field, Record, Role, MISSING_CELL};

use serde::Serialize;

/// Input format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TableFormat {
    /// VOTable or Astrores XML
    Xml,
    /// Character-separated values
    Csv,
    /// FITS file with ASCII or binary table extensions
    Fits,
    /// Could not be determined
    Unknown,
}

/// Error returned when parsing a `TableFormat` from string fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseTableFormatError {
    _private: (),
}

impl std::fmt::Display for ParseTableFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid format name, expected 'xml', 'csv', or 'fits'")
    }
}

impl std::error::Error for ParseTableFormatError {}

impl std::str::FromStr for TableFormat {
    type Err = ParseTableFormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" | "votable" | "astrores" => Ok(TableFormat::Xml),
            "csv" | "tsv" => Ok(TableFormat::Csv),
            "fits" => Ok(TableFormat::Fits),
            _ => Err(ParseTableFormatError { _private: () }),
        }
    }
}

impl TableFormat {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Xml => "xml",
            TableFormat::Csv => "csv",
            TableFormat::Fits => "fits",
            TableFormat::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_format_from_str() {
        assert_eq!("VOTable".parse::<TableFormat>().unwrap(), TableFormat::Xml);
        assert_eq!("tsv".parse::<TableFormat>().unwrap(), TableFormat::Csv);
        assert_eq!("FITS".parse::<TableFormat>().unwrap(), TableFormat::Fits);
        assert!("parquet".parse::<TableFormat>().is_err());
    }
}
