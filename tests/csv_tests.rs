// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CSV/TSV end-to-end tests.

mod common;

use astrocodec::{DiagnosticKind, ParserConfig, Role, MISSING_CELL};
use common::{assert_close, parse_bytes, parse_with};

#[test]
fn test_tsv_ra_dec_two_icrs_records() {
    let parsed = parse_bytes(b"RA\tDEC\n10.0\t20.0\n30.0\t40.0\n");
    parsed.result.as_ref().unwrap();

    let table = &parsed.sink.tables[0];
    assert_eq!(table.fields[0].role, Some(Role::Ra));
    assert_eq!(table.fields[1].role, Some(Role::Dec));
    assert_eq!(table.records.len(), 2);
    assert_eq!(table.records[0].lon, Some(10.0));
    assert_eq!(table.records[0].lat, Some(20.0));
    assert_eq!(table.records[1].lon, Some(30.0));
    assert_eq!(table.records[1].lat, Some(40.0));
    assert_eq!(parsed.sink.warnings().count(), 0);
}

#[test]
fn test_short_row_padded_with_one_warning() {
    let parsed = parse_bytes(b"RA\tDEC\tmag\n10\t20\t5\n11\t21\n");
    let table = &parsed.sink.tables[0];
    assert_eq!(table.records[1].raw, vec!["11", "21", MISSING_CELL]);
    assert_eq!(parsed.diagnostics(DiagnosticKind::Alignment).len(), 1);
}

#[test]
fn test_sexagesimal_cells() {
    let parsed = parse_bytes(b"RA\tDEC\n12:30:00\t-45:30:00\n");
    let record = &parsed.sink.tables[0].records[0];
    assert_close(record.lon, 187.5, 1e-9);
    assert_close(record.lat, -45.5, 1e-9);
}

#[test]
fn test_units_line_after_header() {
    let parsed = parse_with(
        ParserConfig::default().with_field_separators(","),
        b"ra,dec,epoch\ndeg,deg,yr\n150.1,2.2,2000.0\n",
    );
    let table = &parsed.sink.tables[0];
    assert_eq!(table.records.len(), 1);
    assert_eq!(table.fields[0].unit.as_deref(), Some("deg"));
    assert_eq!(table.records[0].lon, Some(150.1));
}

#[test]
fn test_headerless_values_probe_positions() {
    let parsed = parse_with(
        ParserConfig::default().with_field_separators(","),
        b"7,150.25,-30.5\n8,151.0,-31.0\n",
    );
    let table = &parsed.sink.tables[0];
    assert_eq!(table.fields[0].name, "Col_1");
    assert_eq!(table.fields[1].role, Some(Role::Ra));
    assert_eq!(table.records.len(), 2);
    assert_eq!(table.records[1].lat, Some(-31.0));
}

#[test]
fn test_end_of_data_marker() {
    let parsed = parse_bytes(b"RA\tDEC\n1\t2\n[EOD]\n3\t4\n");
    assert_eq!(parsed.sink.record_count(), 1);
}

#[test]
fn test_xy_table_passes_through() {
    let parsed = parse_bytes(b"X\tY\n100.5\t-3\n");
    let record = &parsed.sink.tables[0].records[0];
    assert_eq!(record.lon, Some(100.5));
    assert_eq!(record.lat, Some(-3.0));
}

#[test]
fn test_coordinate_less_table() {
    let parsed = parse_bytes(b"name\tflux\nalpha\t1.5\n");
    let table = &parsed.sink.tables[0];
    assert_eq!(table.records[0].lon, None);
    assert!(table.fields.iter().all(|f| f.role.is_none()));
}

#[test]
fn test_small_read_buffer_same_result() {
    let text = b"RA\tDEC\tname\n10.0\t20.0\tfirst\n30.0\t40.0\tsecond\n";
    let whole = parse_bytes(text);
    let small = parse_with(ParserConfig::default().with_read_buffer_size(3), text);
    assert_eq!(whole.sink.tables, small.sink.tables);
}
