// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::fs::File;
use std::io::{IsTerminal as _, Read};
use std::path::{Path, PathBuf};

use astrocodec::io::detection::{detect_format, sniff_separators, SNIFF_LEN};
use astrocodec::{Diagnostic, Field, ParserConfig, RecordSink, TableFormat};

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn setup_logging(verbose: u8) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("astrocodec={level}")));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

/// Global options that shape the parser configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub config: Option<PathBuf>,
    pub separator: Option<String>,
}

/// Build the configuration for `input`.
///
/// Order: defaults, then the TOML file, then `--separator`. Without either,
/// CSV separators are sniffed from the first line of the file.
pub fn load_config(options: &ConfigOptions, input: &Path) -> Result<ParserConfig> {
    let mut config = match &options.config {
        Some(path) => ParserConfig::from_file(path)?,
        None => ParserConfig::default(),
    };
    match &options.separator {
        Some(separator) => {
            config = config.with_field_separators(unescape_separator(separator));
        }
        None if options.config.is_none() && detect_format(input)? == TableFormat::Csv => {
            let head = read_head(input)?;
            config = config.with_field_separators(sniff_separators(&head));
        }
        None => {}
    }
    config.validate()?;
    Ok(config)
}

/// Expand `\t`, `\n` and `\\` written on the command line.
pub fn unescape_separator(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// First bytes of a file.
pub fn read_head(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head)?;
    Ok(head)
}

/// Format a Julian date as a calendar date in the same time scale.
pub fn format_jd(jd: f64) -> String {
    let seconds = (jd - UNIX_EPOCH_JD) * 86_400.0;
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    match chrono::DateTime::<chrono::Utc>::from_timestamp(whole as i64, nanos) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
        None => format!("JD {jd}"),
    }
}

/// Spinner on stderr, shown only on a terminal.
pub struct Spinner {
    inner: Option<indicatif::ProgressBar>,
}

impl Spinner {
    pub fn new(prefix: impl Into<String>) -> Self {
        let inner = if std::io::stderr().is_terminal() {
            let pb = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {prefix} {msg}")
            {
                pb.set_style(style);
            }
            pb.set_prefix(prefix.into());
            Some(pb)
        } else {
            None
        };
        Self { inner }
    }

    pub fn set_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.set_message(msg);
        }
    }

    pub fn finish_with_message(&self, msg: String) {
        if let Some(pb) = &self.inner {
            pb.finish_with_message(msg);
        }
    }
}

/// Sink adapter that updates a spinner every 1000 records.
pub struct ProgressSink<'a> {
    inner: &'a mut dyn RecordSink,
    spinner: &'a Spinner,
    records: u64,
}

impl<'a> ProgressSink<'a> {
    pub fn new(inner: &'a mut dyn RecordSink, spinner: &'a Spinner) -> Self {
        Self {
            inner,
            spinner,
            records: 0,
        }
    }

    pub fn records(&self) -> u64 {
        self.records
    }
}

impl RecordSink for ProgressSink<'_> {
    fn on_resource_start(&mut self, name: Option<&str>) {
        self.inner.on_resource_start(name);
    }

    fn on_resource_end(&mut self) {
        self.inner.on_resource_end();
    }

    fn on_table_start(&mut self, name: Option<&str>) {
        self.inner.on_table_start(name);
    }

    fn on_field(&mut self, field: &Field) {
        self.inner.on_field(field);
    }

    fn on_record(&mut self, lon: Option<f64>, lat: Option<f64>, time_jd: Option<f64>, raw: &[String]) {
        self.inner.on_record(lon, lat, time_jd, raw);
        self.records += 1;
        if self.records % 1000 == 0 {
            self.spinner.set_message(format!("{} records", self.records));
        }
    }

    fn on_table_end(&mut self) {
        self.inner.on_table_end();
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.inner.on_diagnostic(diagnostic);
    }
}
