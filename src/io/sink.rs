// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Consumer side of a parse.
//!
//! A [`RecordSink`] receives the structure of the document (resources,
//! tables, fields), one call per record with the canonical position and
//! time, and every diagnostic. All methods have empty defaults so a sink
//! only implements what it needs.

use serde::Serialize;

use crate::core::{Diagnostic, Field};

/// Receiver of parse events.
///
/// # Example
///
/// ```
/// use astrocodec::io::RecordSink;
///
/// struct Counter(usize);
///
/// impl RecordSink for Counter {
///     fn on_record(&mut self, _: Option<f64>, _: Option<f64>, _: Option<f64>, _: &[String]) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait RecordSink {
    /// A RESOURCE element opened.
    fn on_resource_start(&mut self, _name: Option<&str>) {}

    /// A RESOURCE element closed.
    fn on_resource_end(&mut self) {}

    /// A table started; fields follow.
    fn on_table_start(&mut self, _name: Option<&str>) {}

    /// A column of the current table, with its role already assigned.
    fn on_field(&mut self, _field: &Field) {}

    /// One record: ICRS degrees (or X/Y), TCB JD, and the raw cells.
    fn on_record(
        &mut self,
        _lon: Option<f64>,
        _lat: Option<f64>,
        _time_jd: Option<f64>,
        _raw: &[String],
    ) {
    }

    /// The current table ended.
    fn on_table_end(&mut self) {}

    /// A non-fatal condition.
    fn on_diagnostic(&mut self, _diagnostic: &Diagnostic) {}
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn on_resource_start(&mut self, name: Option<&str>) {
        (**self).on_resource_start(name)
    }

    fn on_resource_end(&mut self) {
        (**self).on_resource_end()
    }

    fn on_table_start(&mut self, name: Option<&str>) {
        (**self).on_table_start(name)
    }

    fn on_field(&mut self, field: &Field) {
        (**self).on_field(field)
    }

    fn on_record(
        &mut self,
        lon: Option<f64>,
        lat: Option<f64>,
        time_jd: Option<f64>,
        raw: &[String],
    ) {
        (**self).on_record(lon, lat, time_jd, raw)
    }

    fn on_table_end(&mut self) {
        (**self).on_table_end()
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        (**self).on_diagnostic(diagnostic)
    }
}

/// A record as collected by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectedRecord {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub time_jd: Option<f64>,
    pub raw: Vec<String>,
}

/// A table as collected by [`CollectingSink`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectedTable {
    pub name: Option<String>,
    pub resource: Option<String>,
    pub fields: Vec<Field>,
    pub records: Vec<CollectedRecord>,
    /// Whether `on_table_end` was seen
    pub complete: bool,
}

/// Sink that keeps everything in memory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectingSink {
    pub tables: Vec<CollectedTable>,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    resources: Vec<Option<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all tables.
    pub fn record_count(&self) -> usize {
        self.tables.iter().map(|t| t.records.len()).sum()
    }

    /// Records of every table, in order.
    pub fn records(&self) -> impl Iterator<Item = &CollectedRecord> {
        self.tables.iter().flat_map(|t| t.records.iter())
    }

    /// Diagnostics at warning severity or above.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity >= crate::core::Severity::Warning)
    }

    fn current(&mut self) -> &mut CollectedTable {
        if self.tables.last().map_or(true, |t| t.complete) {
            self.tables.push(CollectedTable::default());
        }
        let last = self.tables.len() - 1;
        &mut self.tables[last]
    }
}

impl RecordSink for CollectingSink {
    fn on_resource_start(&mut self, name: Option<&str>) {
        self.resources.push(name.map(str::to_string));
    }

    fn on_resource_end(&mut self) {
        self.resources.pop();
    }

    fn on_table_start(&mut self, name: Option<&str>) {
        self.tables.push(CollectedTable {
            name: name.map(str::to_string),
            resource: self.resources.last().cloned().flatten(),
            ..Default::default()
        });
    }

    fn on_field(&mut self, field: &Field) {
        self.current().fields.push(field.clone());
    }

    fn on_record(
        &mut self,
        lon: Option<f64>,
        lat: Option<f64>,
        time_jd: Option<f64>,
        raw: &[String],
    ) {
        self.current().records.push(CollectedRecord {
            lon,
            lat,
            time_jd,
            raw: raw.to_vec(),
        });
    }

    fn on_table_end(&mut self) {
        if let Some(table) = self.tables.last_mut() {
            table.complete = true;
        }
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}
