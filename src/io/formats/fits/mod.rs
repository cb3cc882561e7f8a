// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! FITS table reader.
//!
//! [`FitsStreamParser`] walks the header-data units of a FITS stream. The
//! primary HDU and image extensions are skipped; every `TABLE` and
//! `BINTABLE` extension becomes one table of the session. A table whose
//! header cannot be laid out is reported as a format diagnostic, its data
//! is skipped, and the following extensions are still read.
//!
//! Rows are read in chunks of `fits_chunk_records`. Tables with heap
//! columns are read whole, since descriptors may point anywhere in the heap.

pub mod header;
pub mod table;

use std::io::Read;

use tracing::{debug, warn};

pub use header::{CardHeader, HeaderAccessor, BLOCK_SIZE};
pub use table::{BinaryForm, FitsColumn, FitsTableLayout, TableEncoding};

use crate::core::{Diagnostic, DiagnosticKind};
use crate::encoding::FeedStatus;
use crate::io::session::ParseSession;
use crate::{CodecError, Result};

use header::read_full;

/// Extension types skipped without a diagnostic.
const IMAGE_EXTENSIONS: [&str; 2] = ["IMAGE", "IUEIMAGE"];

/// Upper bound of one row buffer and of a whole heap table held in memory.
const MAX_BUFFER_BYTES: usize = 1 << 30;

/// Walks the HDUs of a FITS stream and feeds its tables to a session.
#[derive(Debug, Clone, Default)]
pub struct FitsStreamParser {
    extnum: Option<usize>,
}

impl FitsStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read only extension `extnum` (1 is the first extension) into the
    /// table already open in the session.
    ///
    /// This is the VOTable `<FITS extnum="..">` case: the fields declared
    /// by the VOTable are kept when present.
    pub fn with_extnum(extnum: usize) -> Self {
        Self {
            extnum: Some(extnum),
        }
    }

    /// Parse every HDU of `reader`.
    ///
    /// Returns [`FeedStatus::Stopped`] when the session was cancelled and
    /// [`FeedStatus::Finished`] otherwise. Only I/O failures are errors.
    pub fn parse<R: Read + ?Sized>(
        &self,
        reader: &mut R,
        session: &mut ParseSession<'_>,
    ) -> Result<FeedStatus> {
        let mut hdu = 0usize;
        loop {
            if session.is_cancelled() {
                return Ok(FeedStatus::Stopped);
            }
            let header = match CardHeader::read_from(reader) {
                Ok(Some(header)) => header,
                Ok(None) => break,
                Err(e @ CodecError::Format { .. }) => {
                    session.abort_table(&e);
                    break;
                }
                Err(e) => return Err(e),
            };
            let index = hdu;
            hdu += 1;

            let padded = match data_unit_size(&header) {
                Ok(size) => padded_size(size),
                Err(e) => {
                    // Without a data size the next header cannot be located.
                    session.abort_table(&e);
                    break;
                }
            };
            let wanted = match self.extnum {
                Some(n) => index == n,
                None => index > 0,
            };
            if !wanted {
                debug!(hdu = index, bytes = padded, "skipping HDU");
                skip(reader, padded)?;
                continue;
            }

            let xtension = header.opt_string("XTENSION").unwrap_or_default();
            let Some(encoding) = TableEncoding::from_xtension(&xtension) else {
                if !IMAGE_EXTENSIONS.contains(&xtension.as_str()) {
                    let error = CodecError::format(
                        format!("HDU {index}"),
                        format!("unsupported extension type '{xtension}'"),
                    );
                    session.diagnostic(Diagnostic::warning(DiagnosticKind::Format, error.to_string()));
                }
                skip(reader, padded)?;
                if self.extnum.is_some() {
                    break;
                }
                continue;
            };

            let layout = match FitsTableLayout::from_header(&header, encoding) {
                Ok(layout) => layout,
                Err(e) => {
                    if self.extnum.is_none() {
                        session.start_table(header.opt_string("EXTNAME").as_deref());
                    }
                    session.abort_table(&e);
                    skip(reader, padded)?;
                    continue;
                }
            };
            let status = self.read_table(reader, &layout, padded, session)?;
            if status == FeedStatus::Stopped {
                return Ok(status);
            }
            if self.extnum.is_some() {
                break;
            }
        }
        Ok(FeedStatus::Finished)
    }

    fn read_table<R: Read + ?Sized>(
        &self,
        reader: &mut R,
        layout: &FitsTableLayout,
        padded: u64,
        session: &mut ParseSession<'_>,
    ) -> Result<FeedStatus> {
        if self.extnum.is_none() {
            session.start_table(layout.name.as_deref());
        }
        if !session.is_frozen() && session.fields().is_empty() {
            for field in layout.fields() {
                session.declare_field(field);
            }
        } else if session.fields().len() != layout.columns.len() {
            warn!(
                declared = session.fields().len(),
                columns = layout.columns.len(),
                "FITS column count differs from the declared fields"
            );
        }
        session.freeze_fields();
        debug!(
            table = layout.name.as_deref().unwrap_or(""),
            rows = layout.rows,
            row_bytes = layout.row_bytes,
            heap = layout.uses_heap(),
            "reading FITS table"
        );

        let (status, consumed) = if layout.uses_heap() {
            self.read_with_heap(reader, layout, session)?
        } else {
            self.read_chunked(reader, layout, session)?
        };
        if status == FeedStatus::Stopped {
            return Ok(status);
        }
        skip(reader, padded.saturating_sub(consumed))?;
        if self.extnum.is_none() {
            session.end_table();
        }
        Ok(FeedStatus::Finished)
    }

    fn read_chunked<R: Read + ?Sized>(
        &self,
        reader: &mut R,
        layout: &FitsTableLayout,
        session: &mut ParseSession<'_>,
    ) -> Result<(FeedStatus, u64)> {
        let row_bytes = layout.row_bytes;
        if row_bytes > MAX_BUFFER_BYTES {
            let error = CodecError::format(
                "NAXIS1",
                format!("row size of {row_bytes} bytes is implausible"),
            );
            session.abort_table(&error);
            return Ok((FeedStatus::NeedMore, 0));
        }
        let chunk_rows = session
            .config()
            .fits_chunk_records
            .min(MAX_BUFFER_BYTES / row_bytes.max(1))
            .min(usize::try_from(layout.rows).unwrap_or(usize::MAX))
            .max(1);
        let max_elements = session.config().max_vector_elements;
        let mut buf = vec![0u8; chunk_rows * row_bytes];
        let mut remaining = layout.rows;
        let mut consumed = 0u64;

        while remaining > 0 {
            let rows = remaining.min(chunk_rows as u64) as usize;
            let wanted = rows * row_bytes;
            let filled = read_full(reader, &mut buf[..wanted])?;
            consumed += filled as u64;
            let complete = if row_bytes == 0 { rows } else { filled / row_bytes };

            for i in 0..complete {
                let row = &buf[i * row_bytes..(i + 1) * row_bytes];
                let cells = match layout.decode_row(row, &[], max_elements) {
                    Ok(cells) => cells,
                    Err(e) => {
                        session.abort_table(&e);
                        return Ok((FeedStatus::NeedMore, consumed));
                    }
                };
                if session.consume_record(cells).is_break() {
                    session.set_unread_tail(buf[(i + 1) * row_bytes..filled].to_vec());
                    return Ok((FeedStatus::Stopped, consumed));
                }
            }
            if filled < wanted {
                let read = layout.rows - remaining + complete as u64;
                let error = CodecError::format(
                    "BINTABLE",
                    format!("data ends after {read} of {} rows", layout.rows),
                );
                session.abort_table(&error);
                return Ok((FeedStatus::NeedMore, consumed));
            }
            remaining -= rows as u64;
        }
        Ok((FeedStatus::Finished, consumed))
    }

    fn read_with_heap<R: Read + ?Sized>(
        &self,
        reader: &mut R,
        layout: &FitsTableLayout,
        session: &mut ParseSession<'_>,
    ) -> Result<(FeedStatus, u64)> {
        let total = match usize::try_from(layout.data_bytes()) {
            Ok(total) if total <= MAX_BUFFER_BYTES => total,
            _ => {
                let error = CodecError::format(
                    "BINTABLE",
                    format!("data unit of {} bytes is too large", layout.data_bytes()),
                );
                session.abort_table(&error);
                return Ok((FeedStatus::NeedMore, 0));
            }
        };
        let mut data = vec![0u8; total];
        let filled = read_full(reader, &mut data)?;
        if filled < total {
            let error = CodecError::format(
                "BINTABLE",
                format!("data unit truncated ({filled} of {total} bytes)"),
            );
            session.abort_table(&error);
            return Ok((FeedStatus::NeedMore, filled as u64));
        }

        let row_bytes = layout.row_bytes;
        let heap_start = (layout.heap_offset as usize).min(total);
        let heap = &data[heap_start..];
        let max_elements = session.config().max_vector_elements;
        for i in 0..layout.rows as usize {
            let row = &data[i * row_bytes..(i + 1) * row_bytes];
            let cells = match layout.decode_row(row, heap, max_elements) {
                Ok(cells) => cells,
                Err(e) => {
                    session.abort_table(&e);
                    return Ok((FeedStatus::NeedMore, filled as u64));
                }
            };
            if session.consume_record(cells).is_break() {
                let main_end = layout.rows as usize * row_bytes;
                session.set_unread_tail(data[(i + 1) * row_bytes..main_end].to_vec());
                return Ok((FeedStatus::Stopped, filled as u64));
            }
        }
        Ok((FeedStatus::Finished, filled as u64))
    }
}

/// Size of an HDU's data unit before padding.
fn data_unit_size(header: &CardHeader) -> Result<u64> {
    let context = "FITS data unit";
    let as_format = |e: CodecError| CodecError::format(context, e.to_string());
    let naxis = header.get_int("NAXIS").map_err(as_format)?;
    if naxis <= 0 {
        return Ok(0);
    }
    let bitpix = header.get_int("BITPIX").map_err(as_format)?;
    let mut elements: u64 = 1;
    for n in 1..=naxis {
        let axis = header.get_int(&format!("NAXIS{n}")).map_err(as_format)?;
        elements = elements.saturating_mul(axis.max(0) as u64);
    }
    let gcount = header.int_or("GCOUNT", 1).map_err(as_format)?.max(0) as u64;
    let pcount = header.int_or("PCOUNT", 0).map_err(as_format)?.max(0) as u64;
    Ok((bitpix.unsigned_abs() / 8)
        .saturating_mul(gcount)
        .saturating_mul(pcount.saturating_add(elements)))
}

fn padded_size(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE as u64)
        .saturating_mul(BLOCK_SIZE as u64)
}

/// Discard `bytes` bytes; a stream ending early is not an error here.
fn skip<R: Read + ?Sized>(reader: &mut R, bytes: u64) -> Result<()> {
    if bytes > 0 {
        std::io::copy(&mut reader.take(bytes), &mut std::io::sink())?;
    }
    Ok(())
}
