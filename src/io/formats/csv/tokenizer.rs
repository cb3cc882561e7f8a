// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reentrant CSV/TSV tokenizer.
//!
//! Text arrives in arbitrary segments; a record may span several calls.
//! When `,` is a field separator, Excel quoting applies: a cell enclosed
//! in double quotes may contain separators and record separators, and `""`
//! stands for one quote. A space separator collapses runs of spaces.

use std::ops::ControlFlow;

/// Splits text into records of cells.
#[derive(Debug, Clone)]
pub struct CsvTokenizer {
    field_separators: Vec<char>,
    record_separators: Vec<char>,
    quoting: bool,
    collapse_spaces: bool,
    line: String,
    in_quotes: bool,
    utf8_tail: Vec<u8>,
    lines: u64,
}

impl CsvTokenizer {
    pub fn new(field_separators: &str, record_separators: &str) -> Self {
        let field_separators: Vec<char> = field_separators.chars().collect();
        let mut record_separators: Vec<char> = record_separators.chars().collect();
        if record_separators.is_empty() {
            record_separators.push('\n');
        }
        Self {
            quoting: field_separators.contains(&','),
            collapse_spaces: field_separators.contains(&' '),
            field_separators,
            record_separators,
            line: String::new(),
            in_quotes: false,
            utf8_tail: Vec::new(),
            lines: 0,
        }
    }

    /// Lines completed so far, blank ones included.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Text of the record currently being assembled.
    pub fn partial(&self) -> &str {
        &self.line
    }

    /// Tokenize a text segment. Each complete non-blank record goes to
    /// `emit`; if `emit` breaks, the byte offset just past that record is
    /// returned so the caller can keep the rest.
    pub fn feed<F>(&mut self, text: &str, mut emit: F) -> ControlFlow<usize>
    where
        F: FnMut(Vec<String>) -> ControlFlow<()>,
    {
        for (index, ch) in text.char_indices() {
            if self.quoting && ch == '"' {
                self.in_quotes = !self.in_quotes;
                self.line.push(ch);
                continue;
            }
            if !self.in_quotes && self.record_separators.contains(&ch) {
                self.lines += 1;
                let line = std::mem::take(&mut self.line);
                if let Some(cells) = self.split(&line) {
                    if emit(cells).is_break() {
                        return ControlFlow::Break(index + ch.len_utf8());
                    }
                }
                continue;
            }
            self.line.push(ch);
        }
        ControlFlow::Continue(())
    }

    /// Tokenize raw bytes, carrying an incomplete UTF-8 sequence to the
    /// next call. Invalid sequences are replaced.
    pub fn feed_bytes<F>(&mut self, bytes: &[u8], emit: F) -> ControlFlow<usize>
    where
        F: FnMut(Vec<String>) -> ControlFlow<()>,
    {
        let carried = self.utf8_tail.len();
        let mut data = std::mem::take(&mut self.utf8_tail);
        data.extend_from_slice(bytes);

        let valid = match std::str::from_utf8(&data) {
            Ok(_) => data.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => data.len(),
        };
        self.utf8_tail = data[valid..].to_vec();
        let text = String::from_utf8_lossy(&data[..valid]);
        match self.feed(&text, emit) {
            // Map the offset back into `bytes`; lossy replacement only
            // happens on invalid input where exact offsets do not matter.
            ControlFlow::Break(offset) => {
                ControlFlow::Break(offset.saturating_sub(carried).min(bytes.len()))
            }
            ControlFlow::Continue(()) => ControlFlow::Continue(()),
        }
    }

    /// Flush the last record if the input did not end with a separator.
    pub fn finish<F>(&mut self, mut emit: F) -> ControlFlow<()>
    where
        F: FnMut(Vec<String>) -> ControlFlow<()>,
    {
        if !self.utf8_tail.is_empty() {
            let tail = std::mem::take(&mut self.utf8_tail);
            self.line.push_str(&String::from_utf8_lossy(&tail));
        }
        self.in_quotes = false;
        let line = std::mem::take(&mut self.line);
        if line.is_empty() {
            return ControlFlow::Continue(());
        }
        self.lines += 1;
        match self.split(&line) {
            Some(cells) => emit(cells),
            None => ControlFlow::Continue(()),
        }
    }

    /// Split one line; blank lines yield `None`.
    pub fn split(&self, line: &str) -> Option<Vec<String>> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return None;
        }
        Some(if self.quoting {
            self.split_quoted(line)
        } else {
            self.split_plain(line)
        })
    }

    fn is_field_separator(&self, ch: char) -> bool {
        self.field_separators.contains(&ch)
    }

    fn split_plain(&self, line: &str) -> Vec<String> {
        let line = if self.collapse_spaces { line.trim_matches(' ') } else { line };
        let mut cells = Vec::new();
        let mut current = String::new();
        let mut previous_space = false;
        for ch in line.chars() {
            if self.is_field_separator(ch) {
                if self.collapse_spaces && ch == ' ' && previous_space {
                    continue;
                }
                previous_space = ch == ' ';
                cells.push(current.trim().to_string());
                current.clear();
            } else {
                previous_space = false;
                current.push(ch);
            }
        }
        cells.push(current.trim().to_string());
        cells
    }

    fn split_quoted(&self, line: &str) -> Vec<String> {
        let mut cells = Vec::new();
        let mut chars = line.chars().peekable();
        loop {
            while chars.peek() == Some(&' ') && !self.is_field_separator(' ') {
                chars.next();
            }
            let mut cell = String::new();
            let quoted = chars.peek() == Some(&'"');
            if quoted {
                chars.next();
                while let Some(ch) = chars.next() {
                    if ch != '"' {
                        cell.push(ch);
                    } else if chars.peek() == Some(&'"') {
                        chars.next();
                        cell.push('"');
                    } else {
                        break;
                    }
                }
            }
            // Text between a closing quote and the separator is dropped.
            let mut more = false;
            for ch in chars.by_ref() {
                if self.is_field_separator(ch) {
                    more = true;
                    break;
                }
                if !quoted {
                    cell.push(ch);
                }
            }
            cells.push(if quoted { cell } else { cell.trim().to_string() });
            if !more {
                break;
            }
        }
        cells
    }
}
