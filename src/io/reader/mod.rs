// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Unified table reader with automatic format detection.
//!
//! [`TableReader`] sniffs the first bytes of the input, picks the XML,
//! CSV or FITS path, and reports everything it reads to a [`RecordSink`].
//!
//! # Example
//!
//! ```rust,no_run
//! use astrocodec::io::{CollectingSink, TableReader};
//! use astrocodec::ParserConfig;
//!
//! let mut reader = TableReader::new(ParserConfig::default());
//! let mut sink = CollectingSink::new();
//! reader.parse_file("catalog.vot", &mut sink)?;
//! for record in sink.records() {
//!     println!("{:?} {:?}", record.lon, record.lat);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::ops::ControlFlow;
use std::path::Path;

use tracing::{debug, info};

use crate::core::{Diagnostic, DiagnosticKind, ParserConfig, Severity, TableFormat};
use crate::encoding::FeedStatus;
use crate::io::detection::{detect_from_bytes, detect_from_extension, SNIFF_LEN};
use crate::io::fetch::{FileFetcher, StreamFetcher};
use crate::io::formats::csv::{CsvTableOptions, CsvTableParser};
use crate::io::formats::fits::FitsStreamParser;
use crate::io::formats::votable::parse_xml;
use crate::io::session::{CancelToken, ParseSession, SessionSummary};
use crate::io::sink::RecordSink;
use crate::{CodecError, Result};

/// Reader for astronomical tables in any supported format.
///
/// One reader serves one parse at a time. [`interrupt`](Self::interrupt)
/// and the token from [`cancel_token`](Self::cancel_token) may be used from
/// another thread while a parse runs.
pub struct TableReader {
    config: ParserConfig,
    fetcher: Option<Box<dyn StreamFetcher>>,
    cancel: CancelToken,
    error: Option<CodecError>,
    table_error: Option<CodecError>,
    unread_tail: Vec<u8>,
    summary: SessionSummary,
}

impl TableReader {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            fetcher: None,
            cancel: CancelToken::new(),
            error: None,
            table_error: None,
            unread_tail: Vec::new(),
            summary: SessionSummary::default(),
        }
    }

    /// Use `fetcher` for `STREAM href` resources instead of [`FileFetcher`].
    pub fn with_fetcher(mut self, fetcher: Box<dyn StreamFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `input`, detecting its format from the first bytes.
    ///
    /// Input that is neither XML nor FITS is read as CSV. Empty input
    /// produces no tables.
    pub fn parse<R: Read>(&mut self, mut input: R, sink: &mut dyn RecordSink) -> Result<()> {
        let mut head = vec![0u8; SNIFF_LEN];
        let filled = read_head(&mut input, &mut head)?;
        head.truncate(filled);
        let format = match detect_from_bytes(&head) {
            TableFormat::Unknown if head.iter().all(u8::is_ascii_whitespace) => {
                self.reset();
                debug!("empty input");
                return Ok(());
            }
            format => format,
        };
        self.parse_as(format, Cursor::new(head).chain(input), sink)
    }

    /// Parse `input` as `format`, skipping detection.
    pub fn parse_as<R: Read>(
        &mut self,
        format: TableFormat,
        input: R,
        sink: &mut dyn RecordSink,
    ) -> Result<()> {
        let fallback = FileFetcher::new();
        let fetcher: &dyn StreamFetcher = match &self.fetcher {
            Some(fetcher) => fetcher.as_ref(),
            None => &fallback,
        };
        let outcome = run(format, input, sink, &self.config, fetcher, &self.cancel);
        self.settle(outcome)
    }

    /// Memory-map and parse the file at `path`.
    ///
    /// Relative `STREAM href` paths are resolved against the file's
    /// directory unless a fetcher was supplied.
    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P, sink: &mut dyn RecordSink) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| CodecError::Io {
                message: format!("{}: {e}", path.display()),
            })?;
        let len = file.metadata()?.len();
        if len == 0 {
            self.reset();
            return Ok(());
        }
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| CodecError::Io {
            message: format!("Failed to mmap {}: {e}", path.display()),
        })?;
        let format = match detect_from_bytes(&mmap[..mmap.len().min(SNIFF_LEN)]) {
            TableFormat::Unknown => detect_from_extension(path),
            format => format,
        };
        info!(path = %path.display(), format = format.as_str(), bytes = len, "parsing table file");

        let base_fetcher;
        let fetcher: &dyn StreamFetcher = match &self.fetcher {
            Some(fetcher) => fetcher.as_ref(),
            None => {
                base_fetcher = match path.parent() {
                    Some(dir) => FileFetcher::with_base_dir(dir),
                    None => FileFetcher::new(),
                };
                &base_fetcher
            }
        };
        let outcome = run(format, &mmap[..], sink, &self.config, fetcher, &self.cancel);
        self.settle(outcome)
    }

    /// The error of the last parse, if any.
    ///
    /// This is the error that ended the parse or, when the parse completed,
    /// the last error that ended a single table.
    pub fn error(&self) -> Option<&CodecError> {
        self.error.as_ref().or(self.table_error.as_ref())
    }

    /// Ask the running parse to stop after the current record.
    pub fn interrupt(&self) {
        self.cancel.cancel();
    }

    /// A handle that interrupts this reader's parses.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Bytes read but not parsed when the last parse stopped early.
    pub fn unread_tail(&self) -> &[u8] {
        &self.unread_tail
    }

    /// Counters of the last parse.
    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    fn reset(&mut self) {
        self.error = None;
        self.table_error = None;
        self.unread_tail.clear();
        self.summary = SessionSummary::default();
        self.cancel.reset();
    }

    fn settle(&mut self, outcome: Outcome) -> Result<()> {
        self.summary = outcome.summary;
        self.unread_tail = outcome.unread_tail;
        self.table_error = outcome.table_error;
        // An interrupt applies to one parse only.
        self.cancel.reset();
        match outcome.result {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }
}

struct Outcome {
    result: Result<()>,
    summary: SessionSummary,
    unread_tail: Vec<u8>,
    table_error: Option<CodecError>,
}

fn run<R: Read>(
    format: TableFormat,
    input: R,
    sink: &mut dyn RecordSink,
    config: &ParserConfig,
    fetcher: &dyn StreamFetcher,
    cancel: &CancelToken,
) -> Outcome {
    let mut session = ParseSession::new(sink, config, cancel.clone());
    let result = dispatch(format, input, &mut session, fetcher);
    if let Err(err) = &result {
        report(&mut session, err);
    }
    let table_error = session.take_table_error();
    let (summary, unread_tail) = session.finish();
    debug!(
        tables = summary.tables,
        records = summary.records,
        cancelled = summary.cancelled,
        "parse finished"
    );
    Outcome {
        result,
        summary,
        unread_tail,
        table_error,
    }
}

fn dispatch<R: Read>(
    format: TableFormat,
    input: R,
    session: &mut ParseSession<'_>,
    fetcher: &dyn StreamFetcher,
) -> Result<()> {
    let capacity = session.config().read_buffer_size;
    match format {
        TableFormat::Xml => {
            let reader = BufReader::with_capacity(capacity, input);
            if let ControlFlow::Break(()) = parse_xml(reader, session, fetcher)? {
                debug!("XML parse stopped");
            }
            Ok(())
        }
        TableFormat::Fits => {
            let mut reader = BufReader::with_capacity(capacity, input);
            FitsStreamParser::new().parse(&mut reader, session)?;
            Ok(())
        }
        TableFormat::Csv => parse_csv(input, session),
        TableFormat::Unknown => Err(CodecError::unsupported("unrecognised table format")),
    }
}

fn parse_csv<R: Read>(mut input: R, session: &mut ParseSession<'_>) -> Result<()> {
    let options = CsvTableOptions::from_config(&session.config().csv);
    let mut parser = CsvTableParser::new(&options);
    let mut buf = vec![0u8; session.config().read_buffer_size.max(1)];
    session.start_table(None);

    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            parser.finish(session);
            break;
        }
        match parser.feed_bytes(session, &buf[..n]) {
            (FeedStatus::NeedMore, _) => {}
            (FeedStatus::Finished, _) => break,
            (FeedStatus::Stopped, consumed) => {
                session.set_unread_tail(buf[consumed.min(n)..n].to_vec());
                break;
            }
        }
    }
    session.end_table();
    Ok(())
}

/// Emit the diagnostic for a terminating error.
fn report(session: &mut ParseSession<'_>, err: &CodecError) {
    match err {
        CodecError::Server { message } => {
            session.diagnostic(Diagnostic::new(
                Severity::Error,
                DiagnosticKind::Server,
                message.clone(),
            ));
        }
        err if err.is_table_fatal() && session.has_table() => session.abort_table(err),
        err => session.diagnostic(Diagnostic::new(
            Severity::Error,
            DiagnosticKind::Format,
            err.to_string(),
        )),
    }
}

fn read_head<R: Read>(input: &mut R, head: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < head.len() {
        match input.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
