// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! FITS table end-to-end tests.

mod common;

use astrocodec::{CodecError, DiagnosticKind, ParserConfig, Role};
use common::{
    assert_close, fits_bintable, fits_header, fits_primary, fits_radec, pad_block, parse_bytes,
    parse_file, parse_with, write_file,
};

#[test]
fn test_bintable_file_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "sources.fits", &fits_radec(&[(10.0, 20.0), (30.0, 40.0)]));

    let parsed = parse_file(&path);
    parsed.result.as_ref().unwrap();
    let table = &parsed.sink.tables[0];
    assert_eq!(table.name.as_deref(), Some("SOURCES"));
    assert_eq!(table.fields[0].role, Some(Role::Ra));
    assert_eq!(table.fields[0].unit.as_deref(), Some("deg"));
    assert_eq!(table.records.len(), 2);
    assert_eq!(table.records[1].lon, Some(30.0));
    assert_eq!(parsed.sink.warnings().count(), 0);
}

#[test]
fn test_ascii_table_extension() {
    let rows = "  150.2500  -30.5000  151.0000  -31.2500";
    let mut bytes = fits_primary();
    bytes.extend(fits_header(&[
        ("XTENSION", "'TABLE   '"),
        ("BITPIX", "8"),
        ("NAXIS", "2"),
        ("NAXIS1", "20"),
        ("NAXIS2", "2"),
        ("PCOUNT", "0"),
        ("GCOUNT", "1"),
        ("TFIELDS", "2"),
        ("TTYPE1", "'RA_DEG'"),
        ("TBCOL1", "1"),
        ("TFORM1", "'F10.4'"),
        ("TTYPE2", "'DEC_DEG'"),
        ("TBCOL2", "11"),
        ("TFORM2", "'F10.4'"),
    ]));
    bytes.extend(pad_block(rows.as_bytes().to_vec(), b' '));

    let parsed = parse_bytes(&bytes);
    parsed.result.as_ref().unwrap();
    let records = &parsed.sink.tables[0].records;
    assert_eq!(records.len(), 2);
    assert_close(records[0].lon, 150.25, 1e-9);
    assert_close(records[1].lat, -31.25, 1e-9);
}

#[test]
fn test_scaled_integer_column() {
    let mut payload = Vec::new();
    for raw in [0i16, 100, -100] {
        payload.extend_from_slice(&raw.to_be_bytes());
    }
    let mut bytes = fits_primary();
    bytes.extend(fits_header(&[
        ("XTENSION", "'BINTABLE'"),
        ("BITPIX", "8"),
        ("NAXIS", "2"),
        ("NAXIS1", "2"),
        ("NAXIS2", "3"),
        ("PCOUNT", "0"),
        ("GCOUNT", "1"),
        ("TFIELDS", "1"),
        ("TTYPE1", "'FLUX'"),
        ("TFORM1", "'I'"),
        ("TSCAL1", "0.5"),
        ("TZERO1", "10.0"),
    ]));
    bytes.extend(pad_block(payload, 0));

    let parsed = parse_bytes(&bytes);
    parsed.result.as_ref().unwrap();
    let cells: Vec<f64> = parsed.sink.tables[0]
        .records
        .iter()
        .map(|r| r.raw[0].parse().unwrap())
        .collect();
    assert_eq!(cells, vec![10.0, 60.0, -40.0]);
}

#[test]
fn test_sibling_extensions_are_separate_tables() {
    let mut bytes = fits_radec(&[(1.0, 2.0)]);
    let mut data = Vec::new();
    data.extend_from_slice(&7i32.to_be_bytes());
    bytes.extend(fits_bintable("COUNTS", &[("N", "J", "")], 4, data));

    let parsed = parse_bytes(&bytes);
    parsed.result.as_ref().unwrap();
    assert_eq!(parsed.sink.tables.len(), 2);
    assert_eq!(parsed.sink.tables[1].name.as_deref(), Some("COUNTS"));
    assert_eq!(parsed.sink.tables[1].records[0].raw, vec!["7"]);
}

#[test]
fn test_chunk_size_does_not_change_records() {
    let rows: Vec<(f64, f64)> = (0..25).map(|i| (i as f64 * 10.0, i as f64 - 12.0)).collect();
    let bytes = fits_radec(&rows);
    let whole = parse_bytes(&bytes);
    let chunked = parse_with(ParserConfig::default().with_fits_chunk_records(4), &bytes);
    assert_eq!(whole.sink.tables, chunked.sink.tables);
    assert_eq!(chunked.sink.record_count(), 25);
}

#[test]
fn test_truncated_data_unit_is_reported() {
    let mut bytes = fits_radec(&[(1.0, 2.0)]);
    // Keep the headers, drop the data block.
    bytes.truncate(bytes.len() - 2880);

    let parsed = parse_bytes(&bytes);
    parsed.result.as_ref().unwrap();
    assert_eq!(parsed.sink.record_count(), 0);
    assert_eq!(parsed.diagnostics(DiagnosticKind::Format).len(), 1);
    assert!(matches!(parsed.reader.error(), Some(CodecError::Format { .. })));
}

#[test]
fn test_corrupt_heap_descriptor_ends_table() {
    let mut row = Vec::new();
    row.extend_from_slice(&(u64::MAX - 7).to_be_bytes());
    row.extend_from_slice(&0u64.to_be_bytes());
    let mut bytes = fits_primary();
    bytes.extend(fits_bintable("SPECTRA", &[("FLUX", "1QD", "")], 16, row));
    bytes.extend(fits_bintable("COUNTS", &[("N", "J", "")], 4, 7i32.to_be_bytes().to_vec()));

    let parsed = parse_bytes(&bytes);
    parsed.result.as_ref().unwrap();
    assert_eq!(parsed.sink.tables.len(), 2);
    assert!(parsed.sink.tables[0].records.is_empty());
    assert_eq!(parsed.sink.tables[1].records[0].raw, vec!["7"]);
    assert_eq!(parsed.diagnostics(DiagnosticKind::Format).len(), 1);
    assert!(matches!(parsed.reader.error(), Some(CodecError::Format { .. })));
}
