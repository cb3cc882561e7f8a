// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for astronomical tables.
//!
//! Format parsers live in [`formats`]; they all report through a
//! [`ParseSession`] into a [`RecordSink`]. [`TableReader`] picks the
//! parser for an input.

pub mod detection;
pub mod fetch;
pub mod formats;
pub mod reader;
pub mod session;
pub mod sink;

pub use detection::{
    detect_format, detect_from_bytes, is_fits_file, is_xml_file, sniff_separators,
    DefaultFormatDetector, FormatDetector,
};
pub use fetch::{FileFetcher, StreamFetcher};
pub use reader::TableReader;
pub use session::{CancelToken, ParseSession, SessionSummary};
pub use sink::{CollectedRecord, CollectedTable, CollectingSink, RecordSink};
