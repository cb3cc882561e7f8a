// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CSV/TSV tables.
//!
//! [`CsvTableParser`] drives the [`CsvTokenizer`] and decides where the
//! header ends:
//!
//! - Line 1 naming RA/DEC (or X/Y) columns is a header; line 2 is then
//!   probed and, when those columns are not numeric there, taken as units.
//! - Line 1 without position names is data when any cell is numeric, and
//!   the columns become `Col_1..Col_N`.
//! - An all-dash line closes an underlined header.
//! - `[EOD]` alone in the first cell ends the table.
//! - `#` lines before the header are comments.

pub mod tokenizer;

use std::ops::ControlFlow;

use crate::astro::angle::{
    detect_notation, looks_numeric, parse_angle, split_combined, AngleKind, AngleUnit,
};
use crate::astro::{RoleClassifier, TableKind};
use crate::core::{CsvConfig, Field, Role};
use crate::encoding::FeedStatus;
use crate::io::session::ParseSession;

pub use tokenizer::CsvTokenizer;

/// Marker that ends a table when it is the only content of the first cell.
pub const END_OF_DATA: &str = "[EOD]";

/// How the first lines of a table are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// Probe the first lines for a header.
    Detect,
    /// Every line is data; columns are named `Col_N`.
    Absent,
    /// Columns were declared elsewhere (VOTable FIELDs); every line is data.
    Declared,
}

/// Separators, header handling and leading lines to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTableOptions {
    pub field_separators: String,
    pub record_separators: String,
    pub header: HeaderMode,
    pub skip_lines: usize,
}

impl CsvTableOptions {
    pub fn from_config(config: &CsvConfig) -> Self {
        Self {
            field_separators: config.field_separators.clone(),
            record_separators: config.record_separators.clone(),
            header: if config.detect_header {
                HeaderMode::Detect
            } else {
                HeaderMode::Absent
            },
            skip_lines: 0,
        }
    }

    pub fn with_header(mut self, header: HeaderMode) -> Self {
        self.header = header;
        self
    }

    pub fn with_separators(mut self, fields: impl Into<String>, records: impl Into<String>) -> Self {
        self.field_separators = fields.into();
        self.record_separators = records.into();
        self
    }

    pub fn with_skip_lines(mut self, lines: usize) -> Self {
        self.skip_lines = lines;
        self
    }
}

#[derive(Debug, Clone)]
enum Phase {
    First,
    Second {
        header: Vec<String>,
        probes: Vec<usize>,
        combined: bool,
    },
    Data,
}

#[derive(Debug, Clone)]
struct LineHandler {
    header: HeaderMode,
    skip: usize,
    phase: Phase,
    ended: bool,
}

fn is_dash_line(cells: &[String]) -> bool {
    cells.iter().any(|c| !c.is_empty())
        && cells
            .iter()
            .all(|c| c.chars().all(|ch| ch == '-' || ch.is_whitespace()))
}

fn is_comment(cells: &[String]) -> bool {
    cells.first().is_some_and(|c| c.starts_with('#'))
}

fn probe_numeric(cell: Option<&String>, combined: bool) -> bool {
    match cell {
        Some(cell) if combined => {
            split_combined(cell).is_some_and(|(ra, dec)| looks_numeric(ra) && looks_numeric(dec))
        }
        Some(cell) => looks_numeric(cell),
        None => false,
    }
}

fn declare_header(session: &mut ParseSession<'_>, names: Vec<String>, units: Option<&[String]>) {
    for (index, name) in names.into_iter().enumerate() {
        let name = if name.is_empty() {
            format!("Col_{}", index + 1)
        } else {
            name
        };
        let mut field = Field::new(name);
        if let Some(unit) = units.and_then(|u| u.get(index)).filter(|u| !u.is_empty()) {
            field.unit = Some(unit.clone());
        }
        session.declare_field(field);
    }
    session.freeze_fields();
}

/// First adjacent pair of cells that reads as RA then DEC.
fn probe_position_pair(cells: &[String]) -> Option<usize> {
    let is_angle_text = |c: &str| c.contains('.') || c.contains(':');
    cells.windows(2).position(|pair| {
        let (ra, dec) = (pair[0].as_str(), pair[1].as_str());
        if !is_angle_text(ra) || !is_angle_text(dec) {
            return false;
        }
        let ra = parse_angle(ra, detect_notation(ra), AngleKind::Longitude, AngleUnit::Degrees);
        let dec = parse_angle(dec, detect_notation(dec), AngleKind::Latitude, AngleUnit::Degrees);
        matches!((ra, dec), (Some(ra), Some(dec))
            if (0.0..=360.0).contains(&ra) && (-90.0..=90.0).contains(&dec))
    })
}

fn declare_anonymous(session: &mut ParseSession<'_>, cells: &[String]) {
    for index in 0..cells.len() {
        session.declare_field(Field::new(format!("Col_{}", index + 1)));
    }
    let mut classifier = RoleClassifier::new();
    if let Some(index) = probe_position_pair(cells) {
        tracing::debug!(ra = index, dec = index + 1, "position columns found from values");
        classifier = classifier.with_hint(Role::Ra, index).with_hint(Role::Dec, index + 1);
    }
    session.freeze_fields_with(&classifier);
}

impl LineHandler {
    fn handle(&mut self, session: &mut ParseSession<'_>, cells: Vec<String>) -> ControlFlow<()> {
        if self.skip > 0 {
            self.skip -= 1;
            return ControlFlow::Continue(());
        }
        if cells.first().is_some_and(|c| c == END_OF_DATA) {
            self.ended = true;
            return ControlFlow::Break(());
        }
        match std::mem::replace(&mut self.phase, Phase::Data) {
            Phase::Data => {
                if is_dash_line(&cells) {
                    return ControlFlow::Continue(());
                }
                session.consume_record(cells)
            }
            Phase::First if is_comment(&cells) || is_dash_line(&cells) => {
                self.phase = Phase::First;
                ControlFlow::Continue(())
            }
            Phase::First => match self.header {
                HeaderMode::Declared => session.consume_record(cells),
                HeaderMode::Absent => {
                    declare_anonymous(session, &cells);
                    session.consume_record(cells)
                }
                HeaderMode::Detect => self.first_line(session, cells),
            },
            Phase::Second {
                header,
                probes,
                combined,
            } => {
                if is_dash_line(&cells) {
                    declare_header(session, header, None);
                    return ControlFlow::Continue(());
                }
                let numeric = probes
                    .iter()
                    .all(|&index| probe_numeric(cells.get(index), combined));
                if numeric {
                    declare_header(session, header, None);
                    session.consume_record(cells)
                } else {
                    tracing::debug!("second line read as units");
                    declare_header(session, header, Some(&cells));
                    ControlFlow::Continue(())
                }
            }
        }
    }

    fn first_line(&mut self, session: &mut ParseSession<'_>, cells: Vec<String>) -> ControlFlow<()> {
        let fields: Vec<Field> = cells.iter().map(Field::new).collect();
        let assignment = RoleClassifier::new().choose(&fields);
        let probes: Vec<usize> = match assignment.kind {
            TableKind::Celestial if assignment.combined => {
                assignment.ra.map(|c| c.index).into_iter().collect()
            }
            TableKind::Celestial => [assignment.ra, assignment.dec]
                .iter()
                .flatten()
                .map(|c| c.index)
                .collect(),
            TableKind::Xy => [assignment.x, assignment.y]
                .iter()
                .flatten()
                .map(|c| c.index)
                .collect(),
            TableKind::CoordinateLess => Vec::new(),
        };
        if !probes.is_empty() {
            self.phase = Phase::Second {
                header: cells,
                probes,
                combined: assignment.combined,
            };
            return ControlFlow::Continue(());
        }
        if cells.iter().any(|c| looks_numeric(c)) {
            declare_anonymous(session, &cells);
            return session.consume_record(cells);
        }
        declare_header(session, cells, None);
        ControlFlow::Continue(())
    }

    /// Settle a header still waiting for its second line.
    fn finish(&mut self, session: &mut ParseSession<'_>) {
        if let Phase::Second { header, .. } = std::mem::replace(&mut self.phase, Phase::Data) {
            declare_header(session, header, None);
        }
    }
}

/// Streaming CSV/TSV table parser.
#[derive(Debug, Clone)]
pub struct CsvTableParser {
    tokenizer: CsvTokenizer,
    lines: LineHandler,
}

impl CsvTableParser {
    pub fn new(options: &CsvTableOptions) -> Self {
        Self {
            tokenizer: CsvTokenizer::new(&options.field_separators, &options.record_separators),
            lines: LineHandler {
                header: options.header,
                skip: options.skip_lines,
                phase: Phase::First,
                ended: false,
            },
        }
    }

    /// Whether `[EOD]` was seen.
    pub fn is_ended(&self) -> bool {
        self.lines.ended
    }

    fn status(&self, flow: ControlFlow<usize>, len: usize) -> (FeedStatus, usize) {
        match flow {
            ControlFlow::Continue(()) => (FeedStatus::NeedMore, len),
            ControlFlow::Break(offset) if self.lines.ended => (FeedStatus::Finished, offset),
            ControlFlow::Break(offset) => (FeedStatus::Stopped, offset),
        }
    }

    /// Feed text; returns the status and the bytes of `text` consumed.
    pub fn feed(&mut self, session: &mut ParseSession<'_>, text: &str) -> (FeedStatus, usize) {
        if self.lines.ended {
            return (FeedStatus::Finished, 0);
        }
        let lines = &mut self.lines;
        let flow = self.tokenizer.feed(text, |cells| lines.handle(session, cells));
        self.status(flow, text.len())
    }

    /// Feed raw bytes; returns the status and the bytes consumed.
    pub fn feed_bytes(&mut self, session: &mut ParseSession<'_>, bytes: &[u8]) -> (FeedStatus, usize) {
        if self.lines.ended {
            return (FeedStatus::Finished, 0);
        }
        let lines = &mut self.lines;
        let flow = self.tokenizer.feed_bytes(bytes, |cells| lines.handle(session, cells));
        self.status(flow, bytes.len())
    }

    /// Flush the last line and settle the header.
    pub fn finish(&mut self, session: &mut ParseSession<'_>) -> FeedStatus {
        if self.lines.ended {
            return FeedStatus::Finished;
        }
        let lines = &mut self.lines;
        let flow = self.tokenizer.finish(|cells| lines.handle(session, cells));
        self.lines.finish(session);
        match flow {
            ControlFlow::Break(()) if self.lines.ended => FeedStatus::Finished,
            ControlFlow::Break(()) => FeedStatus::Stopped,
            ControlFlow::Continue(()) => FeedStatus::Finished,
        }
    }
}
