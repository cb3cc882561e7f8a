// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Resumable decoder for VOTable BINARY and BINARY2 streams.
//!
//! The decoder consumes buffers of any size and produces the same records
//! regardless of where the buffer boundaries fall. All resumption state
//! lives in an explicit [`DecoderState`] that the caller threads through
//! successive [`BinaryStreamDecoder::feed`] calls.
//!
//! # Stream layout
//!
//! ```text
//! BINARY :            <field 0><field 1>...<field N-1>  (repeated)
//! BINARY2: <null mask><field 0><field 1>...<field N-1>  (repeated)
//!
//! null mask      = ceil(N / 8) bytes, bit 7 of byte 0 is field 0
//! variable field = <count: u32 BE><count elements>
//! ```

use std::borrow::Cow;
use std::ops::ControlFlow;

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, warn};

use crate::core::{Field, Record};
use crate::encoding::field_codec::{
    decode_scalar, decode_vector, Precision, TypeCode, ValueFormat,
};
use crate::{CodecError, Result};

/// Upper bound for a single field, guarding against corrupt counts.
const MAX_FIELD_BYTES: usize = 256 * 1024 * 1024;

/// Size of the element count prefix of a variable-length field.
const COUNT_PREFIX: usize = 4;

/// Serialization flavour of a VOTable binary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFlavor {
    /// `<BINARY>`: no null information
    Binary,
    /// `<BINARY2>`: per-record null bitmask
    Binary2,
}

/// Element count of one column in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Fixed number of elements occupying `bytes` bytes
    Fixed { count: usize, bytes: usize },
    /// Element count read from a 4-byte prefix
    Variable,
}

/// Decoding plan for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub type_code: TypeCode,
    pub extent: Extent,
    /// Byte offset inside the record, known while all previous columns are fixed
    pub offset: Option<usize>,
    /// Declared as a single value (not an array of one)
    pub scalar: bool,
    pub format: ValueFormat,
}

impl ColumnLayout {
    /// Build the plan for a declared field.
    ///
    /// A fixed array whose byte size overflows is a format error.
    pub fn from_field(field: &Field) -> Result<Self> {
        let type_code = match field.datatype {
            Some(dt) => TypeCode::from_datatype(dt),
            None => {
                warn!(
                    field = %field.name,
                    "No datatype declared for binary column, decoding one byte per element"
                );
                TypeCode::Unknown('?')
            }
        };
        let extent = match field.array_size.fixed_count() {
            Some(count) => Extent::Fixed {
                count,
                bytes: type_code.checked_span(count, &field.name)?,
            },
            None => Extent::Variable,
        };
        let null = if type_code.is_integer() {
            field
                .null_value
                .as_deref()
                .and_then(|n| n.trim().parse::<i64>().ok())
        } else {
            None
        };
        let precision = field.precision.as_deref().and_then(Precision::parse_votable);
        Ok(Self {
            type_code,
            extent,
            offset: None,
            scalar: !field.array_size.is_array(),
            format: ValueFormat::default()
                .with_precision(precision)
                .with_null(null),
        })
    }
}

/// Resumable state of one table's binary stream.
///
/// Created from the frozen field list when the stream starts and dropped
/// when the stream ends.
#[derive(Debug, Clone, Default)]
pub struct DecoderState {
    /// Per-column type, length and offset
    pub columns: Vec<ColumnLayout>,
    /// Total record size, `None` when variable-length columns are present
    pub record_size: Option<usize>,
    /// Column to decode next
    pub field_index: usize,
    /// Null mask of the current record (BINARY2)
    pub null_mask: Vec<u8>,
    /// Whether the current record's mask has been consumed
    pub mask_read: bool,
    /// Bytes of an incomplete column carried over to the next feed
    pub carry: Vec<u8>,
    /// Cells decoded so far for the current record
    pub current: Record,
    /// Payload bytes (excluding count prefixes and mask) of the current record
    pub record_bytes: usize,
    /// Records emitted so far
    pub records: u64,
    /// Stream terminated by padding
    pub finished: bool,
}

impl DecoderState {
    /// Compute the column plans of a frozen field list.
    pub fn from_fields(fields: &[Field]) -> Result<Self> {
        let mut columns = fields
            .iter()
            .map(ColumnLayout::from_field)
            .collect::<Result<Vec<_>>>()?;
        let mut offset = Some(0usize);
        for column in &mut columns {
            column.offset = offset;
            offset = match (offset, column.extent) {
                (Some(o), Extent::Fixed { bytes, .. }) => {
                    let end = o.checked_add(bytes).ok_or_else(|| {
                        CodecError::format("BINARY stream", "record size overflows")
                    })?;
                    Some(end)
                }
                _ => None,
            };
        }
        debug!(
            columns = columns.len(),
            record_size = ?offset,
            "Binary stream layout computed"
        );
        Ok(Self {
            columns,
            record_size: offset,
            ..Default::default()
        })
    }

    /// Whether every column has a variable length.
    pub fn is_variable_only(&self) -> bool {
        !self.columns.is_empty()
            && self
                .columns
                .iter()
                .all(|c| matches!(c.extent, Extent::Variable))
    }

    /// Bytes belonging to a record that has not been completed yet.
    pub fn pending_bytes(&self) -> &[u8] {
        &self.carry
    }

    /// Whether a record is partially decoded.
    pub fn has_partial_record(&self) -> bool {
        self.field_index > 0 || self.mask_read || !self.carry.is_empty()
    }

    fn is_masked(&self, index: usize) -> bool {
        self.null_mask
            .get(index / 8)
            .is_some_and(|byte| byte & (0x80 >> (index % 8)) != 0)
    }
}

/// Outcome of a [`BinaryStreamDecoder::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Buffer consumed, more input expected
    NeedMore,
    /// The record callback asked to stop
    Stopped,
    /// End of data reached (padding record)
    Finished,
}

/// Decoder configuration; the state lives in [`DecoderState`].
#[derive(Debug, Clone, Copy)]
pub struct BinaryStreamDecoder {
    flavor: BinaryFlavor,
    max_vector_elements: usize,
}

impl BinaryStreamDecoder {
    pub fn new(flavor: BinaryFlavor, max_vector_elements: usize) -> Self {
        Self {
            flavor,
            max_vector_elements,
        }
    }

    pub fn flavor(&self) -> BinaryFlavor {
        self.flavor
    }

    /// Decode as many complete records as `buf` allows.
    ///
    /// `on_record` is called once per completed record, in stream order; it
    /// returns `ControlFlow::Break` to stop decoding (the bytes that follow
    /// are kept in [`DecoderState::pending_bytes`]).
    pub fn feed<F>(
        &self,
        state: &mut DecoderState,
        buf: &[u8],
        mut on_record: F,
    ) -> Result<FeedStatus>
    where
        F: FnMut(Record) -> ControlFlow<()>,
    {
        if state.finished {
            return Ok(FeedStatus::Finished);
        }
        if state.columns.is_empty() {
            return Ok(FeedStatus::NeedMore);
        }

        let data: Cow<'_, [u8]> = if state.carry.is_empty() {
            Cow::Borrowed(buf)
        } else {
            let mut joined = std::mem::take(&mut state.carry);
            joined.extend_from_slice(buf);
            Cow::Owned(joined)
        };
        let data: &[u8] = &data;
        let field_count = state.columns.len();
        let mut pos = 0usize;

        loop {
            if state.field_index == 0 && !state.mask_read {
                if pos == data.len() {
                    break;
                }
                if self.flavor == BinaryFlavor::Binary2 {
                    let mask_len = field_count.div_ceil(8);
                    if data.len() - pos < mask_len {
                        state.carry = data[pos..].to_vec();
                        return Ok(FeedStatus::NeedMore);
                    }
                    state.null_mask.clear();
                    state.null_mask.extend_from_slice(&data[pos..pos + mask_len]);
                    pos += mask_len;
                }
                state.mask_read = true;
                state.record_bytes = 0;
            }

            let column = &state.columns[state.field_index];
            let remaining = data.len() - pos;
            let (count, start, payload) = match column.extent {
                Extent::Fixed { count, bytes } => (count, pos, bytes),
                Extent::Variable => {
                    if remaining < COUNT_PREFIX {
                        state.carry = data[pos..].to_vec();
                        return Ok(FeedStatus::NeedMore);
                    }
                    let count = BigEndian::read_u32(&data[pos..pos + COUNT_PREFIX]) as usize;
                    let payload = column.type_code.checked_span(count, "BINARY stream")?;
                    (count, pos + COUNT_PREFIX, payload)
                }
            };
            if payload > MAX_FIELD_BYTES {
                return Err(CodecError::format(
                    "BINARY stream",
                    format!(
                        "field {} declares {payload} bytes, stream is likely corrupt",
                        state.field_index
                    ),
                ));
            }
            let span = (start - pos) + payload;
            if remaining < span {
                state.carry = data[pos..].to_vec();
                return Ok(FeedStatus::NeedMore);
            }

            let value = if self.flavor == BinaryFlavor::Binary2 && state.is_masked(state.field_index)
            {
                String::new()
            } else if column.scalar && count == 1 {
                decode_scalar(data, start, column.type_code, &column.format)?
            } else {
                decode_vector(
                    data,
                    start,
                    count,
                    column.type_code,
                    &column.format,
                    self.max_vector_elements,
                )?
            };
            state.current.push(value);
            state.record_bytes += payload;
            state.field_index += 1;
            pos += span;

            if state.field_index == field_count {
                let record = std::mem::take(&mut state.current);
                state.field_index = 0;
                state.mask_read = false;
                if state.record_bytes == 0 && state.is_variable_only() {
                    debug!(
                        records = state.records,
                        "Empty record in variable-only stream, treating remainder as padding"
                    );
                    state.finished = true;
                    return Ok(FeedStatus::Finished);
                }
                state.records += 1;
                if on_record(record).is_break() {
                    state.carry = data[pos..].to_vec();
                    return Ok(FeedStatus::Stopped);
                }
            }
        }

        Ok(FeedStatus::NeedMore)
    }

    /// Close the stream, returning the number of bytes left in an incomplete record.
    pub fn finish(&self, state: &mut DecoderState) -> usize {
        let leftover = state.carry.len();
        let partial = state.has_partial_record();
        state.carry.clear();
        state.current.clear();
        state.field_index = 0;
        state.mask_read = false;
        if partial && !state.finished {
            warn!(
                records = state.records,
                leftover, "Binary stream ended inside a record, partial record dropped"
            );
            leftover.max(1)
        } else {
            0
        }
    }
}
