// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Convert command - write canonical positions and times with the raw cells.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde_json::{Map, Value};
use tracing::info;

use crate::common::{load_config, ConfigOptions, ProgressSink, Result, Spinner};
use astrocodec::{CancelToken, Diagnostic, Field, RecordSink, Severity, TableReader};

/// Output encoding.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated, one header line per table
    Csv,
    /// One JSON object per record
    Jsonl,
}

/// Write every record with its ICRS position and TCB time.
#[derive(Args, Clone, Debug)]
pub struct ConvertCmd {
    /// Input file (VOTable, Astrores, CSV/TSV or FITS)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Stop after this many records
    #[arg(long, value_name = "N")]
    limit: Option<u64>,
}

impl ConvertCmd {
    pub fn run(self, options: &ConfigOptions) -> Result<()> {
        let config = load_config(options, &self.input)?;
        let mut reader = TableReader::new(config);

        let out: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };
        let mut sink = OutputSink::new(out, self.format);
        if let Some(limit) = self.limit {
            sink = sink.with_limit(limit, reader.cancel_token());
        }

        let spinner = Spinner::new(self.input.display().to_string());
        let result = {
            let mut progress = ProgressSink::new(&mut sink, &spinner);
            let result = reader.parse_file(&self.input, &mut progress);
            spinner.finish_with_message(format!("{} records", progress.records()));
            result
        };
        let written = sink.finish()?;
        info!(records = written, "conversion finished");
        result?;
        Ok(())
    }
}

enum Output<W: Write> {
    Csv(csv::Writer<W>),
    Jsonl(W),
}

/// Sink writing records as CSV or JSON lines.
struct OutputSink<W: Write> {
    out: Output<W>,
    table_name: Option<String>,
    tables: usize,
    fields: Vec<String>,
    header_written: bool,
    records: u64,
    limit: Option<(u64, CancelToken)>,
    error: Option<io::Error>,
}

impl<W: Write> OutputSink<W> {
    fn new(out: W, format: OutputFormat) -> Self {
        let out = match format {
            // Tables differ in width, so records are not length-checked.
            OutputFormat::Csv => {
                Output::Csv(csv::WriterBuilder::new().flexible(true).from_writer(out))
            }
            OutputFormat::Jsonl => Output::Jsonl(out),
        };
        Self {
            out,
            table_name: None,
            tables: 0,
            fields: Vec::new(),
            header_written: false,
            records: 0,
            limit: None,
            error: None,
        }
    }

    fn with_limit(mut self, limit: u64, token: CancelToken) -> Self {
        self.limit = Some((limit, token));
        self
    }

    /// Flush and return the number of records written, or the first
    /// write error.
    fn finish(mut self) -> io::Result<u64> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        match &mut self.out {
            Output::Csv(writer) => writer.flush()?,
            Output::Jsonl(out) => out.flush()?,
        }
        Ok(self.records)
    }

    fn write_record(
        &mut self,
        lon: Option<f64>,
        lat: Option<f64>,
        time_jd: Option<f64>,
        raw: &[String],
    ) -> io::Result<()> {
        match &mut self.out {
            Output::Csv(writer) => {
                if !self.header_written {
                    if self.tables > 1 {
                        // Blank line between tables.
                        writer.flush()?;
                        writer.get_mut().write_all(b"\n")?;
                    }
                    let header = ["lon", "lat", "time_jd"]
                        .into_iter()
                        .chain(self.fields.iter().map(String::as_str));
                    writer.write_record(header)?;
                    self.header_written = true;
                }
                let canonical = [lon, lat, time_jd].map(|v| v.map(|v| v.to_string()).unwrap_or_default());
                let row = canonical
                    .iter()
                    .map(String::as_str)
                    .chain(raw.iter().map(String::as_str));
                writer.write_record(row)?;
                Ok(())
            }
            Output::Jsonl(out) => {
                let mut cells = Map::new();
                for (index, value) in raw.iter().enumerate() {
                    let name = self
                        .fields
                        .get(index)
                        .cloned()
                        .unwrap_or_else(|| format!("Col_{}", index + 1));
                    cells.insert(name, Value::String(value.clone()));
                }
                let line = serde_json::json!({
                    "table": self.table_name.clone().unwrap_or_else(|| self.tables.to_string()),
                    "lon": lon,
                    "lat": lat,
                    "time_jd": time_jd,
                    "cells": cells,
                });
                serde_json::to_writer(&mut *out, &line)?;
                writeln!(out)
            }
        }
    }
}

impl<W: Write> RecordSink for OutputSink<W> {
    fn on_table_start(&mut self, name: Option<&str>) {
        self.tables += 1;
        self.table_name = name.map(str::to_string);
        self.fields.clear();
        self.header_written = false;
    }

    fn on_field(&mut self, field: &Field) {
        self.fields.push(field.name.clone());
    }

    fn on_record(&mut self, lon: Option<f64>, lat: Option<f64>, time_jd: Option<f64>, raw: &[String]) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_record(lon, lat, time_jd, raw) {
            self.error = Some(err);
            if let Some((_, token)) = &self.limit {
                token.cancel();
            }
            return;
        }
        self.records += 1;
        if let Some((limit, token)) = &self.limit {
            if self.records >= *limit {
                token.cancel();
            }
        }
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        if diagnostic.severity >= Severity::Warning {
            eprintln!("{diagnostic}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn written(sink: OutputSink<Vec<u8>>) -> String {
        let bytes = match sink.out {
            Output::Csv(writer) => writer.into_inner().map_err(|e| e.to_string()).unwrap(),
            Output::Jsonl(out) => out,
        };
        String::from_utf8(bytes).unwrap()
    }

    fn feed(sink: &mut OutputSink<Vec<u8>>) {
        sink.on_table_start(Some("obs"));
        sink.on_field(&Field::new("RA"));
        sink.on_field(&Field::new("note"));
        sink.on_record(Some(10.5), Some(-2.0), None, &cells(&["10.5", "a,b"]));
    }

    #[test]
    fn test_csv_output() {
        let mut sink = OutputSink::new(Vec::new(), OutputFormat::Csv);
        feed(&mut sink);
        assert_eq!(
            written(sink),
            "lon,lat,time_jd,RA,note\n10.5,-2,,10.5,\"a,b\"\n"
        );
    }

    #[test]
    fn test_csv_tables_differ_in_width() {
        let mut sink = OutputSink::new(Vec::new(), OutputFormat::Csv);
        feed(&mut sink);
        sink.on_table_start(Some("extra"));
        sink.on_field(&Field::new("quote"));
        sink.on_record(None, None, Some(2451545.0), &cells(&["say \"hi\""]));
        assert_eq!(
            written(sink),
            "lon,lat,time_jd,RA,note\n10.5,-2,,10.5,\"a,b\"\n\n\
             lon,lat,time_jd,quote\n,,2451545,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_jsonl_output() {
        let mut sink = OutputSink::new(Vec::new(), OutputFormat::Jsonl);
        feed(&mut sink);
        let text = written(sink);
        let value: Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["table"], "obs");
        assert_eq!(value["lon"], 10.5);
        assert!(value["time_jd"].is_null());
        assert_eq!(value["cells"]["note"], "a,b");
    }

    #[test]
    fn test_limit_cancels() {
        let token = CancelToken::new();
        let mut sink = OutputSink::new(Vec::new(), OutputFormat::Csv).with_limit(1, token.clone());
        feed(&mut sink);
        assert!(token.is_cancelled());
        assert_eq!(sink.finish().unwrap(), 1);
    }
}
