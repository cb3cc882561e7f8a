// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - show tables, fields, roles and diagnostics.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::common::{format_jd, load_config, ConfigOptions, ProgressSink, Result, Spinner};
use astrocodec::{Diagnostic, Field, RecordSink, TableReader};

/// Show what a table file contains.
#[derive(Args, Clone, Debug)]
pub struct InspectCmd {
    /// Input file (VOTable, Astrores, CSV/TSV or FITS)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn extend(range: &mut Option<Range>, value: Option<f64>) {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return;
        };
        match range {
            Some(r) => {
                r.min = r.min.min(value);
                r.max = r.max.max(value);
            }
            None => *range = Some(Range { min: value, max: value }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FieldSummary {
    name: String,
    unit: Option<String>,
    ucd: Option<String>,
    role: Option<&'static str>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct TableSummary {
    name: Option<String>,
    resource: Option<String>,
    fields: Vec<FieldSummary>,
    records: u64,
    lon: Option<Range>,
    lat: Option<Range>,
    time_jd: Option<Range>,
}

/// Keeps counts and ranges, not records.
#[derive(Debug, Default, Serialize)]
struct InspectSink {
    tables: Vec<TableSummary>,
    diagnostics: Vec<Diagnostic>,
    #[serde(skip)]
    resources: Vec<Option<String>>,
}

impl InspectSink {
    fn current(&mut self) -> &mut TableSummary {
        if self.tables.is_empty() {
            self.tables.push(TableSummary::default());
        }
        let last = self.tables.len() - 1;
        &mut self.tables[last]
    }
}

impl RecordSink for InspectSink {
    fn on_resource_start(&mut self, name: Option<&str>) {
        self.resources.push(name.map(str::to_string));
    }

    fn on_resource_end(&mut self) {
        self.resources.pop();
    }

    fn on_table_start(&mut self, name: Option<&str>) {
        self.tables.push(TableSummary {
            name: name.map(str::to_string),
            resource: self.resources.last().cloned().flatten(),
            ..Default::default()
        });
    }

    fn on_field(&mut self, field: &Field) {
        self.current().fields.push(FieldSummary {
            name: field.name.clone(),
            unit: field.unit.clone(),
            ucd: field.ucd.clone(),
            role: field.role.map(|r| r.as_str()),
        });
    }

    fn on_record(&mut self, lon: Option<f64>, lat: Option<f64>, time_jd: Option<f64>, _raw: &[String]) {
        let table = self.current();
        table.records += 1;
        Range::extend(&mut table.lon, lon);
        Range::extend(&mut table.lat, lat);
        Range::extend(&mut table.time_jd, time_jd);
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

impl InspectCmd {
    pub fn run(self, options: &ConfigOptions) -> Result<()> {
        let config = load_config(options, &self.input)?;
        let mut reader = TableReader::new(config);
        let mut sink = InspectSink::default();

        let spinner = Spinner::new(self.input.display().to_string());
        let result = {
            let mut progress = ProgressSink::new(&mut sink, &spinner);
            let result = reader.parse_file(&self.input, &mut progress);
            spinner.finish_with_message(format!("{} records", progress.records()));
            result
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&sink)?);
        } else {
            print_summary(&self.input, &sink);
        }
        result?;
        Ok(())
    }
}

fn print_summary(input: &std::path::Path, sink: &InspectSink) {
    println!("=== {} ===", input.display());
    println!("Tables: {}", sink.tables.len());

    for (index, table) in sink.tables.iter().enumerate() {
        println!();
        println!(
            "[{}] {}{}",
            index + 1,
            table.name.as_deref().unwrap_or("(unnamed)"),
            table
                .resource
                .as_deref()
                .map(|r| format!(" in {r}"))
                .unwrap_or_default()
        );
        println!("  Records: {}", table.records);
        for field in &table.fields {
            println!(
                "  {:<24} {:<8} {:<12} {}",
                field.name,
                field.role.unwrap_or("-"),
                field.unit.as_deref().unwrap_or(""),
                field.ucd.as_deref().unwrap_or("")
            );
        }
        if let (Some(lon), Some(lat)) = (table.lon, table.lat) {
            println!(
                "  Position: lon {:.6}..{:.6}  lat {:.6}..{:.6}",
                lon.min, lon.max, lat.min, lat.max
            );
        }
        if let Some(time) = table.time_jd {
            println!("  Time (TCB): {} .. {}", format_jd(time.min), format_jd(time.max));
        }
    }

    if !sink.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        for diagnostic in &sink.diagnostics {
            println!("  {diagnostic}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_sink_ranges() {
        let mut sink = InspectSink::default();
        sink.on_table_start(Some("t"));
        sink.on_record(Some(10.0), Some(-5.0), None, &[]);
        sink.on_record(Some(20.0), Some(5.0), Some(2_451_545.0), &[]);
        sink.on_record(None, None, None, &[]);

        let table = &sink.tables[0];
        assert_eq!(table.records, 3);
        assert_eq!(table.lon.map(|r| (r.min, r.max)), Some((10.0, 20.0)));
        assert_eq!(table.lat.map(|r| (r.min, r.max)), Some((-5.0, 5.0)));
        assert_eq!(table.time_jd.map(|r| r.min), Some(2_451_545.0));
    }
}
