// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! State of one parse: the current table, its fields and resolver, the
//! frame declarations seen so far, and cancellation.
//!
//! Every format path reports through [`ParseSession`]; it is the only place
//! that talks to the [`RecordSink`].

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::astro::{FrameMetadata, RecordResolver, RoleClassifier};
use crate::core::{CodecError, Diagnostic, DiagnosticKind, Field, ParserConfig, MISSING_CELL};

use super::sink::RecordSink;

/// Cancellation flag shared with the owning application.
///
/// Polled once per completed record, so a record is never cut in half.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
struct TableState {
    name: Option<String>,
    fields: Vec<Field>,
    frozen: bool,
    resolver: Option<RecordResolver>,
    records: u64,
}

/// Counters of a finished parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub tables: u64,
    pub records: u64,
    pub cancelled: bool,
}

/// Mutable state of one `parse()` call.
pub struct ParseSession<'s> {
    sink: &'s mut dyn RecordSink,
    config: &'s ParserConfig,
    cancel: CancelToken,
    metadata: FrameMetadata,
    table: Option<TableState>,
    time_warned: bool,
    cancelled: bool,
    tables: u64,
    records: u64,
    unread_tail: Vec<u8>,
    table_error: Option<CodecError>,
}

impl<'s> ParseSession<'s> {
    pub fn new(sink: &'s mut dyn RecordSink, config: &'s ParserConfig, cancel: CancelToken) -> Self {
        Self {
            sink,
            config,
            cancel,
            metadata: FrameMetadata::new(),
            table: None,
            time_warned: false,
            cancelled: false,
            tables: 0,
            records: 0,
            unread_tail: Vec::new(),
            table_error: None,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        self.config
    }

    pub fn metadata(&self) -> &FrameMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut FrameMetadata {
        &mut self.metadata
    }

    pub fn start_resource(&mut self, name: Option<&str>) {
        self.sink.on_resource_start(name);
    }

    pub fn end_resource(&mut self) {
        self.end_table();
        self.sink.on_resource_end();
    }

    /// Open a table, closing the previous one.
    pub fn start_table(&mut self, name: Option<&str>) {
        self.end_table();
        tracing::debug!(table = name.unwrap_or(""), "table started");
        self.sink.on_table_start(name);
        self.tables += 1;
        self.table = Some(TableState {
            name: name.map(str::to_string),
            ..Default::default()
        });
    }

    pub fn has_table(&self) -> bool {
        self.table.is_some()
    }

    /// Add a column to the current table.
    ///
    /// Columns arriving after the fields were frozen are ignored.
    pub fn declare_field(&mut self, field: Field) {
        if self.table.is_none() {
            self.start_table(None);
        }
        let Some(table) = self.table.as_mut() else {
            return;
        };
        if table.frozen {
            let message = format!("Field '{}' declared after the data started, ignored", field.name);
            self.diagnostic(Diagnostic::warning(DiagnosticKind::Format, message));
            return;
        }
        table.fields.push(field);
    }

    pub fn fields(&self) -> &[Field] {
        self.table.as_ref().map_or(&[], |t| t.fields.as_slice())
    }

    /// Mutable access to the fields, until they are frozen.
    pub fn fields_mut(&mut self) -> Option<&mut Vec<Field>> {
        self.table
            .as_mut()
            .filter(|t| !t.frozen)
            .map(|t| &mut t.fields)
    }

    pub fn is_frozen(&self) -> bool {
        self.table.as_ref().is_some_and(|t| t.frozen)
    }

    /// Fix the field list and assign roles. Runs once per table.
    pub fn freeze_fields(&mut self) {
        self.freeze_fields_with(&RoleClassifier::new());
    }

    /// Like [`freeze_fields`](Self::freeze_fields) with a prepared classifier.
    pub fn freeze_fields_with(&mut self, classifier: &RoleClassifier) {
        if self.table.is_none() {
            self.start_table(None);
        }
        let mut diagnostics = Vec::new();
        {
            let Some(table) = self.table.as_mut() else {
                return;
            };
            if table.frozen {
                return;
            }
            let assignment = classifier.choose(&table.fields);
            for (index, role) in assignment.roles() {
                table.fields[index].role = Some(role);
            }
            table.resolver = Some(RecordResolver::new(
                &table.fields,
                &assignment,
                &self.metadata,
                &mut diagnostics,
            ));
            table.frozen = true;
            for field in &table.fields {
                self.sink.on_field(field);
            }
        }
        for diagnostic in diagnostics {
            self.diagnostic(diagnostic);
        }
    }

    /// Deliver one record of the current table.
    ///
    /// Short records are padded with `"???"`, long ones truncated; both
    /// raise an alignment warning. Returns `Break` once the parse is
    /// cancelled.
    pub fn consume_record(&mut self, mut cells: Vec<String>) -> ControlFlow<()> {
        if self.cancelled {
            return ControlFlow::Break(());
        }
        if !self.is_frozen() {
            self.freeze_fields();
        }
        let expected = self.fields().len();
        let row = self.table.as_ref().map_or(0, |t| t.records) + 1;
        if expected > 0 && cells.len() != expected {
            let message = if cells.len() < expected {
                format!("Record {row} has {} cells, expected {expected}; padded", cells.len())
            } else {
                format!("Record {row} has {} cells, expected {expected}; extra cells dropped", cells.len())
            };
            cells.resize(expected, MISSING_CELL.to_string());
            self.diagnostic(Diagnostic::warning(DiagnosticKind::Alignment, message));
        }

        let Some(table) = self.table.as_mut() else {
            return ControlFlow::Continue(());
        };
        let resolved = table
            .resolver
            .as_mut()
            .map(|r| r.resolve(&cells))
            .unwrap_or_default();
        self.sink
            .on_record(resolved.lon, resolved.lat, resolved.time_jd, &cells);
        table.records += 1;
        self.records += 1;

        if self.cancel.is_cancelled() {
            self.cancelled = true;
            let message = format!("Parse interrupted after {} records", self.records);
            self.diagnostic(Diagnostic::warning(DiagnosticKind::Truncation, message));
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    /// Close the current table, if any.
    pub fn end_table(&mut self) {
        if self.table.is_none() {
            return;
        }
        if !self.is_frozen() {
            self.freeze_fields();
        }
        if let Some(table) = self.table.take() {
            tracing::debug!(
                table = table.name.as_deref().unwrap_or(""),
                records = table.records,
                "table finished"
            );
            self.sink.on_table_end();
        }
    }

    /// Report a format error that ends the current table.
    pub fn abort_table(&mut self, error: &CodecError) {
        tracing::warn!(fields = ?error.log_fields(), "table aborted");
        self.table_error = Some(error.clone());
        self.diagnostic(Diagnostic::new(
            crate::core::Severity::Error,
            DiagnosticKind::Format,
            error.to_string(),
        ));
        self.end_table();
    }

    /// Forward a diagnostic to the sink and to tracing.
    ///
    /// Time system problems are reported once per session.
    pub fn diagnostic(&mut self, diagnostic: Diagnostic) {
        if diagnostic.kind == DiagnosticKind::TimeSystem {
            if self.time_warned {
                tracing::debug!("{}", diagnostic.message);
                return;
            }
            self.time_warned = true;
        }
        diagnostic.log();
        self.sink.on_diagnostic(&diagnostic);
    }

    /// The error that ended the most recent aborted table.
    pub fn take_table_error(&mut self) -> Option<CodecError> {
        self.table_error.take()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Records delivered so far, across tables.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Keep bytes that were read but not parsed because the parse stopped.
    pub fn set_unread_tail(&mut self, tail: Vec<u8>) {
        self.unread_tail = tail;
    }

    /// Close any open table and return the counters and the unread tail.
    pub fn finish(mut self) -> (SessionSummary, Vec<u8>) {
        self.end_table();
        let summary = SessionSummary {
            tables: self.tables,
            records: self.records,
            cancelled: self.cancelled,
        };
        (summary, self.unread_tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::io::sink::CollectingSink;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_padding_and_truncation() {
        let config = ParserConfig::default();
        let mut sink = CollectingSink::new();
        let mut session = ParseSession::new(&mut sink, &config, CancelToken::new());
        session.start_table(None);
        session.declare_field(Field::new("a"));
        session.declare_field(Field::new("b"));
        let _ = session.consume_record(cells(&["1"]));
        let _ = session.consume_record(cells(&["1", "2", "3"]));
        let _ = session.finish();

        let table = &sink.tables[0];
        assert_eq!(table.records[0].raw, cells(&["1", MISSING_CELL]));
        assert_eq!(table.records[1].raw, cells(&["1", "2"]));
        assert_eq!(sink.warnings().count(), 2);
    }

    #[test]
    fn test_freeze_assigns_roles_once() {
        let config = ParserConfig::default();
        let mut sink = CollectingSink::new();
        let mut session = ParseSession::new(&mut sink, &config, CancelToken::new());
        session.declare_field(Field::new("RA"));
        session.declare_field(Field::new("DEC"));
        session.freeze_fields();
        session.freeze_fields();
        session.declare_field(Field::new("late"));
        let _ = session.consume_record(cells(&["10", "20"]));
        let _ = session.finish();

        let table = &sink.tables[0];
        assert_eq!(table.fields.len(), 2);
        assert_eq!(table.fields[0].role, Some(Role::Ra));
        assert_eq!(table.fields[1].role, Some(Role::Dec));
        assert_eq!(table.records[0].lon, Some(10.0));
        assert_eq!(sink.diagnostics.len(), 1);
    }

    #[test]
    fn test_cancellation_after_record() {
        let config = ParserConfig::default();
        let mut sink = CollectingSink::new();
        let token = CancelToken::new();
        let mut session = ParseSession::new(&mut sink, &config, token.clone());
        session.declare_field(Field::new("n"));
        assert!(session.consume_record(cells(&["1"])).is_continue());
        token.cancel();
        assert!(session.consume_record(cells(&["2"])).is_break());
        assert!(session.consume_record(cells(&["3"])).is_break());
        let (summary, _) = session.finish();

        assert!(summary.cancelled);
        assert_eq!(summary.records, 2);
        assert_eq!(sink.record_count(), 2);
        assert_eq!(sink.diagnostics.last().map(|d| d.kind), Some(DiagnosticKind::Truncation));
    }

    #[test]
    fn test_time_warning_once_per_session() {
        let config = ParserConfig::default();
        let mut sink = CollectingSink::new();
        let mut session = ParseSession::new(&mut sink, &config, CancelToken::new());
        for _ in 0..2 {
            session.start_table(None);
            session.declare_field(Field::new("mjd"));
            session.freeze_fields();
        }
        let _ = session.finish();
        let time_warnings = sink
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::TimeSystem)
            .count();
        assert_eq!(time_warnings, 1);
        assert_eq!(sink.tables.len(), 2);
    }
}
