// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Column layout of FITS `TABLE` and `BINTABLE` extensions.
//!
//! The layout is computed once from the header. Rows are then decoded from
//! raw bytes; variable-length (`P`/`Q`) columns read their elements from
//! the heap that follows the main table.

use std::sync::OnceLock;

use byteorder::{BigEndian, ByteOrder};
use regex::Regex;
use tracing::warn;

use super::header::HeaderAccessor;
use crate::core::{ArraySize, DataType, Field, Record};
use crate::encoding::field_codec::{
    decode_ascii_cell, decode_scalar, decode_vector, AsciiFormat, Precision, Scaling, TypeCode,
    ValueFormat,
};
use crate::{CodecError, Result};

/// Table extension flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEncoding {
    /// `XTENSION = 'TABLE'`
    Ascii,
    /// `XTENSION = 'BINTABLE'`
    Binary,
}

impl TableEncoding {
    /// Map an `XTENSION` value; images and unknown extensions give `None`.
    pub fn from_xtension(value: &str) -> Option<Self> {
        match value.trim() {
            "TABLE" => Some(TableEncoding::Ascii),
            "BINTABLE" | "A3DTABLE" => Some(TableEncoding::Binary),
            _ => None,
        }
    }
}

/// Heap array descriptor width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// `P`: two 32-bit integers
    P,
    /// `Q`: two 64-bit integers
    Q,
}

impl Descriptor {
    fn size(&self) -> usize {
        match self {
            Descriptor::P => 8,
            Descriptor::Q => 16,
        }
    }

    /// `(element count, heap offset)` of the descriptor at `offset`.
    ///
    /// Values beyond `usize` saturate and fail the later bounds checks.
    fn read(&self, row: &[u8], offset: usize) -> (usize, usize) {
        let (count, heap_offset) = match self {
            Descriptor::P => (
                BigEndian::read_u32(&row[offset..]) as u64,
                BigEndian::read_u32(&row[offset + 4..]) as u64,
            ),
            Descriptor::Q => (
                BigEndian::read_u64(&row[offset..]),
                BigEndian::read_u64(&row[offset + 8..]),
            ),
        };
        let clamp = |v: u64| usize::try_from(v).unwrap_or(usize::MAX);
        (clamp(count), clamp(heap_offset))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CellLayout {
    Ascii {
        format: AsciiFormat,
        null: Option<String>,
    },
    Fixed {
        code: TypeCode,
        repeat: usize,
    },
    Heap {
        code: TypeCode,
        descriptor: Descriptor,
    },
}

/// Placement and decoding of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct FitsColumn {
    pub field: Field,
    /// Byte offset inside the row
    pub offset: usize,
    /// Bytes occupied inside the row
    pub width: usize,
    format: ValueFormat,
    cell: CellLayout,
}

impl FitsColumn {
    /// Whether the values live in the heap.
    pub fn uses_heap(&self) -> bool {
        matches!(self.cell, CellLayout::Heap { .. })
    }

    fn decode(&self, row: &[u8], heap: &[u8], max_elements: usize) -> Result<String> {
        let raw = &row[self.offset..self.offset + self.width];
        match &self.cell {
            CellLayout::Ascii { format, null } => {
                Ok(decode_ascii_cell(raw, *format, &self.format, null.as_deref()))
            }
            CellLayout::Fixed { repeat: 0, .. } => Ok(String::new()),
            CellLayout::Fixed { code, repeat: 1 } if *code != TypeCode::Bit => {
                decode_scalar(raw, 0, *code, &self.format)
            }
            CellLayout::Fixed { code, repeat } => {
                decode_vector(raw, 0, *repeat, *code, &self.format, max_elements)
            }
            CellLayout::Heap { code, descriptor } => {
                let (count, offset) = descriptor.read(raw, 0);
                if count == 0 {
                    return Ok(String::new());
                }
                decode_vector(heap, offset, count, *code, &self.format, max_elements)
            }
        }
    }
}

/// Parsed `TFORMn` of a binary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryForm {
    pub repeat: usize,
    pub code: TypeCode,
    /// Set for `P`/`Q` columns; `code` is then the heap element type
    pub descriptor: Option<Descriptor>,
    /// Declared maximum heap array length, `rPt(max)`
    pub max: Option<usize>,
}

fn binary_tform_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d*)([A-Za-z])([A-Za-z])?(?:\((\d+)\))?").expect("valid TFORM pattern")
    })
}

impl BinaryForm {
    pub fn parse(text: &str) -> Option<Self> {
        let caps = binary_tform_regex().captures(text)?;
        let repeat = match caps.get(1).map(|m| m.as_str()) {
            Some("") | None => 1,
            Some(digits) => digits.parse().ok()?,
        };
        let letter = caps.get(2)?.as_str().chars().next()?.to_ascii_uppercase();
        let descriptor = match letter {
            'P' => Some(Descriptor::P),
            'Q' => Some(Descriptor::Q),
            _ => None,
        };
        let code = match (descriptor, caps.get(3)) {
            (Some(_), Some(element)) => TypeCode::from_tform(element.as_str().chars().next()?),
            (Some(_), None) => return None,
            (None, _) => TypeCode::from_tform(letter),
        };
        if let TypeCode::Unknown(letter) = code {
            warn!(
                tform = %text.trim(),
                code = %letter,
                "Unknown TFORM type, decoding one byte per element"
            );
        }
        Some(Self {
            repeat,
            code,
            descriptor,
            max: caps.get(4).and_then(|m| m.as_str().parse().ok()),
        })
    }

    /// Bytes occupied in the row; an overflowing repeat count is a
    /// format error.
    pub fn width(&self) -> Result<usize> {
        match self.descriptor {
            Some(d) if self.repeat > 0 => Ok(d.size()),
            Some(_) => Ok(0),
            None => self.code.checked_span(self.repeat, "TFORM"),
        }
    }
}

fn datatype_of(code: TypeCode) -> Option<DataType> {
    let dt = match code {
        TypeCode::Logical => DataType::Logical,
        TypeCode::Bit => DataType::Bit,
        TypeCode::UnsignedByte => DataType::UnsignedByte,
        TypeCode::Short => DataType::Short,
        TypeCode::Int => DataType::Int,
        TypeCode::Long => DataType::Long,
        TypeCode::Char => DataType::Char,
        TypeCode::UnicodeChar => DataType::UnicodeChar,
        TypeCode::Float => DataType::Float,
        TypeCode::Double => DataType::Double,
        TypeCode::FloatComplex => DataType::FloatComplex,
        TypeCode::DoubleComplex => DataType::DoubleComplex,
        TypeCode::Unknown(_) => return None,
    };
    Some(dt)
}

/// Everything needed to decode the rows of one table extension.
#[derive(Debug, Clone, PartialEq)]
pub struct FitsTableLayout {
    pub name: Option<String>,
    pub encoding: TableEncoding,
    pub columns: Vec<FitsColumn>,
    /// `NAXIS1`
    pub row_bytes: usize,
    /// `NAXIS2`
    pub rows: u64,
    /// `PCOUNT`: bytes after the main table (gap and heap)
    pub heap_bytes: u64,
    /// `THEAP`: heap start relative to the data start
    pub heap_offset: u64,
}

impl FitsTableLayout {
    /// Build the layout of a table extension.
    ///
    /// Missing mandatory keywords, unparsable formats and a row size that
    /// disagrees with `NAXIS1` are format errors.
    pub fn from_header(header: &dyn HeaderAccessor, encoding: TableEncoding) -> Result<Self> {
        let context = match encoding {
            TableEncoding::Ascii => "TABLE",
            TableEncoding::Binary => "BINTABLE",
        };
        let mandatory = |key: &str| {
            header
                .get_int(key)
                .map_err(|e| CodecError::format(context, e.to_string()))
        };
        let bitpix = mandatory("BITPIX")?;
        let naxis = mandatory("NAXIS")?;
        if bitpix != 8 || naxis != 2 {
            return Err(CodecError::format(
                context,
                format!("expected BITPIX = 8 and NAXIS = 2, found {bitpix} and {naxis}"),
            ));
        }
        let row_bytes = non_negative(context, "NAXIS1", mandatory("NAXIS1")?)? as usize;
        let rows = non_negative(context, "NAXIS2", mandatory("NAXIS2")?)?;
        let tfields = non_negative(context, "TFIELDS", mandatory("TFIELDS")?)? as usize;
        let heap_bytes = non_negative(context, "PCOUNT", header.int_or("PCOUNT", 0)?)?;
        let main_bytes = rows.checked_mul(row_bytes as u64).ok_or_else(|| {
            CodecError::format(context, format!("{rows} rows of {row_bytes} bytes overflow"))
        })?;
        let heap_offset = non_negative(context, "THEAP", header.int_or("THEAP", main_bytes as i64)?)?;

        let mut columns = Vec::with_capacity(tfields);
        let mut offset = 0usize;
        for n in 1..=tfields {
            let column = match encoding {
                TableEncoding::Ascii => ascii_column(header, n, row_bytes)?,
                TableEncoding::Binary => {
                    let column = binary_column(header, n, offset)?;
                    offset = offset.checked_add(column.width).ok_or_else(|| {
                        CodecError::format(context, "column widths overflow")
                    })?;
                    column
                }
            };
            columns.push(column);
        }
        if encoding == TableEncoding::Binary && offset != row_bytes {
            return Err(CodecError::format(
                context,
                format!("columns occupy {offset} bytes but NAXIS1 is {row_bytes}"),
            ));
        }

        Ok(Self {
            name: header.opt_string("EXTNAME"),
            encoding,
            columns,
            row_bytes,
            rows,
            heap_bytes,
            heap_offset,
        })
    }

    pub fn fields(&self) -> Vec<Field> {
        self.columns.iter().map(|c| c.field.clone()).collect()
    }

    /// Whether any column reads from the heap.
    pub fn uses_heap(&self) -> bool {
        self.columns.iter().any(FitsColumn::uses_heap)
    }

    /// Size of the data unit before padding.
    pub fn data_bytes(&self) -> u64 {
        self.rows
            .saturating_mul(self.row_bytes as u64)
            .saturating_add(self.heap_bytes)
    }

    /// Decode one row. `heap` is the heap area (empty when unused).
    pub fn decode_row(&self, row: &[u8], heap: &[u8], max_elements: usize) -> Result<Record> {
        if row.len() < self.row_bytes {
            return Err(CodecError::buffer_too_short(self.row_bytes, row.len(), 0));
        }
        self.columns
            .iter()
            .map(|c| c.decode(row, heap, max_elements))
            .collect()
    }
}

fn non_negative(context: &str, key: &str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| CodecError::format(context, format!("{key} = {value} is negative")))
}

/// Field descriptor shared by both encodings.
fn describe(header: &dyn HeaderAccessor, n: usize) -> Field {
    let mut field = Field::new(
        header
            .opt_string(&format!("TTYPE{n}"))
            .unwrap_or_else(|| format!("col{n}")),
    );
    field.unit = header.opt_string(&format!("TUNIT{n}"));
    field.ucd = header.opt_string(&format!("TUCD{n}"));
    field.description = header.opt_string(&format!("TCOMM{n}"));
    field.precision = header.opt_string(&format!("TDISP{n}"));
    field.null_value = header.opt_string(&format!("TNULL{n}"));
    field
}

fn value_format(header: &dyn HeaderAccessor, n: usize, field: &Field) -> Result<ValueFormat> {
    let scale = header.double_or(&format!("TSCAL{n}"), 1.0)?;
    let zero = header.double_or(&format!("TZERO{n}"), 0.0)?;
    let precision = field.precision.as_deref().and_then(Precision::parse_tdisp);
    Ok(ValueFormat::default()
        .with_scaling(Scaling::new(scale, zero))
        .with_precision(precision))
}

fn ascii_column(header: &dyn HeaderAccessor, n: usize, row_bytes: usize) -> Result<FitsColumn> {
    let context = format!("TFORM{n}");
    let tform = header
        .get_string(&context)
        .map_err(|e| CodecError::format("TABLE", e.to_string()))?;
    let format = AsciiFormat::parse(&tform)
        .ok_or_else(|| CodecError::format(&context, format!("invalid ASCII format '{tform}'")))?;
    let tbcol = header
        .get_int(&format!("TBCOL{n}"))
        .map_err(|e| CodecError::format("TABLE", e.to_string()))?;
    let width = format.width();
    if tbcol < 1 || tbcol as usize - 1 + width > row_bytes {
        return Err(CodecError::format(
            format!("TBCOL{n}"),
            format!("column at {tbcol} with width {width} exceeds the {row_bytes}-byte row"),
        ));
    }

    let mut field = describe(header, n);
    field.width = Some(width);
    field.datatype = Some(match format {
        AsciiFormat::Char(_) => DataType::Char,
        AsciiFormat::Int(_) => DataType::Long,
        _ => DataType::Double,
    });
    if let AsciiFormat::Char(w) = format {
        field.array_size = ArraySize::Fixed(w);
    }
    let value = value_format(header, n, &field)?;
    Ok(FitsColumn {
        offset: tbcol as usize - 1,
        width,
        format: value,
        cell: CellLayout::Ascii {
            format,
            null: field.null_value.clone(),
        },
        field,
    })
}

fn binary_column(header: &dyn HeaderAccessor, n: usize, offset: usize) -> Result<FitsColumn> {
    let context = format!("TFORM{n}");
    let tform = header
        .get_string(&context)
        .map_err(|e| CodecError::format("BINTABLE", e.to_string()))?;
    let form = BinaryForm::parse(&tform)
        .ok_or_else(|| CodecError::format(&context, format!("invalid binary format '{tform}'")))?;

    let mut field = describe(header, n);
    field.datatype = datatype_of(form.code);
    field.array_size = match form.descriptor {
        Some(_) => ArraySize::Variable { max: form.max },
        None if form.repeat == 1 && !form.code.is_text() => ArraySize::Scalar,
        None => ArraySize::Fixed(form.repeat),
    };
    let null = if form.code.is_integer() {
        field
            .null_value
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
    } else {
        None
    };
    let format = value_format(header, n, &field)?.with_null(null);
    let cell = match form.descriptor {
        Some(descriptor) if form.repeat > 0 => CellLayout::Heap {
            code: form.code,
            descriptor,
        },
        Some(_) => CellLayout::Fixed {
            code: form.code,
            repeat: 0,
        },
        None => CellLayout::Fixed {
            code: form.code,
            repeat: form.repeat,
        },
    };
    Ok(FitsColumn {
        field,
        offset,
        width: form.width()?,
        format,
        cell,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::formats::fits::header::tests::header_bytes;
    use crate::io::formats::fits::header::CardHeader;

    fn header(cards: &[(&str, &str)]) -> CardHeader {
        CardHeader::parse(&header_bytes(cards)).unwrap()
    }

    fn bintable(extra: &[(&str, &str)]) -> CardHeader {
        let mut cards = vec![
            ("XTENSION", "'BINTABLE'"),
            ("BITPIX", "8"),
            ("NAXIS", "2"),
            ("NAXIS1", "14"),
            ("NAXIS2", "1"),
            ("PCOUNT", "0"),
            ("GCOUNT", "1"),
            ("TFIELDS", "3"),
            ("TTYPE1", "'RA'"),
            ("TFORM1", "'D'"),
            ("TUNIT1", "'deg'"),
            ("TTYPE2", "'FLUX'"),
            ("TFORM2", "'I'"),
            ("TSCAL2", "0.5"),
            ("TNULL2", "-1"),
            ("TTYPE3", "'NAME'"),
            ("TFORM3", "'4A'"),
        ];
        cards.extend_from_slice(extra);
        header(&cards)
    }

    #[test]
    fn test_binary_form_parse() {
        let form = BinaryForm::parse("10E").unwrap();
        assert_eq!((form.repeat, form.code, form.width().unwrap()), (10, TypeCode::Float, 40));
        let form = BinaryForm::parse("1PJ(25)").unwrap();
        assert_eq!(form.descriptor, Some(Descriptor::P));
        assert_eq!(form.code, TypeCode::Int);
        assert_eq!(form.max, Some(25));
        assert_eq!(form.width().unwrap(), 8);
        assert_eq!(BinaryForm::parse("QD").unwrap().width().unwrap(), 16);
        assert_eq!(BinaryForm::parse("13X").unwrap().width().unwrap(), 2);
        assert!(BinaryForm::parse("1P").is_none());
    }

    #[test]
    fn test_overflowing_repeat_is_format_error() {
        let form = BinaryForm::parse("9999999999999999999D").unwrap();
        assert!(matches!(form.width(), Err(CodecError::Format { .. })));
    }

    #[test]
    fn test_unknown_tform_decodes_bytes() {
        let form = BinaryForm::parse("3Z").unwrap();
        assert_eq!(form.code, TypeCode::Unknown('Z'));
        assert_eq!(form.width().unwrap(), 3);

        let header = header(&[
            ("XTENSION", "'BINTABLE'"),
            ("BITPIX", "8"),
            ("NAXIS", "2"),
            ("NAXIS1", "3"),
            ("NAXIS2", "1"),
            ("TFIELDS", "1"),
            ("TTYPE1", "'RAW'"),
            ("TFORM1", "'3Z'"),
        ]);
        let layout = FitsTableLayout::from_header(&header, TableEncoding::Binary).unwrap();
        assert_eq!(layout.columns[0].field.datatype, None);
        let cells = layout.decode_row(&[1, 2, 255], &[], 100).unwrap();
        assert_eq!(cells, vec!["1 2 255"]);
    }

    #[test]
    fn test_binary_layout_and_row() {
        let layout = FitsTableLayout::from_header(&bintable(&[]), TableEncoding::Binary).unwrap();
        assert_eq!(layout.row_bytes, 14);
        assert_eq!(layout.columns[1].offset, 8);
        assert_eq!(layout.columns[0].field.unit.as_deref(), Some("deg"));
        assert_eq!(layout.columns[2].field.array_size, ArraySize::Fixed(4));

        let mut row = Vec::new();
        row.extend_from_slice(&10.5f64.to_be_bytes());
        row.extend_from_slice(&7i16.to_be_bytes());
        row.extend_from_slice(b"M31 ");
        let cells = layout.decode_row(&row, &[], 100).unwrap();
        assert_eq!(cells, vec!["10.5", "3.5", "M31"]);

        row[8..10].copy_from_slice(&(-1i16).to_be_bytes());
        assert_eq!(layout.decode_row(&row, &[], 100).unwrap()[1], "");
    }

    #[test]
    fn test_row_size_mismatch() {
        let header = bintable(&[("NAXIS1", "16")]);
        let err = FitsTableLayout::from_header(&header, TableEncoding::Binary).unwrap_err();
        assert!(matches!(err, CodecError::Format { .. }));
    }

    #[test]
    fn test_missing_tfields_is_format_error() {
        let header = header(&[("BITPIX", "8"), ("NAXIS", "2"), ("NAXIS1", "0"), ("NAXIS2", "0")]);
        let err = FitsTableLayout::from_header(&header, TableEncoding::Binary).unwrap_err();
        assert!(matches!(err, CodecError::Format { .. }));
    }

    #[test]
    fn test_ascii_layout_and_null() {
        let header = header(&[
            ("XTENSION", "'TABLE'"),
            ("BITPIX", "8"),
            ("NAXIS", "2"),
            ("NAXIS1", "16"),
            ("NAXIS2", "1"),
            ("TFIELDS", "2"),
            ("TTYPE1", "'DEC'"),
            ("TBCOL1", "1"),
            ("TFORM1", "'F8.3'"),
            ("TTYPE2", "'N'"),
            ("TBCOL2", "10"),
            ("TFORM2", "'I5'"),
            ("TNULL2", "'-999'"),
        ]);
        let layout = FitsTableLayout::from_header(&header, TableEncoding::Ascii).unwrap();
        assert_eq!(layout.columns[1].offset, 9);
        let cells = layout.decode_row(b"  41.269  -999  ", &[], 100).unwrap();
        assert_eq!(cells, vec!["41.269", ""]);
    }

    #[test]
    fn test_heap_column() {
        let header = header(&[
            ("XTENSION", "'BINTABLE'"),
            ("BITPIX", "8"),
            ("NAXIS", "2"),
            ("NAXIS1", "8"),
            ("NAXIS2", "1"),
            ("PCOUNT", "12"),
            ("TFIELDS", "1"),
            ("TTYPE1", "'SPEC'"),
            ("TFORM1", "'1PJ(3)'"),
        ]);
        let layout = FitsTableLayout::from_header(&header, TableEncoding::Binary).unwrap();
        assert!(layout.uses_heap());
        assert_eq!(layout.heap_offset, 8);
        assert_eq!(layout.data_bytes(), 20);

        let mut row = Vec::new();
        row.extend_from_slice(&3u32.to_be_bytes());
        row.extend_from_slice(&0u32.to_be_bytes());
        let heap: Vec<u8> = [1i32, 2, 3].iter().flat_map(|v| v.to_be_bytes()).collect();
        assert_eq!(layout.decode_row(&row, &heap, 100).unwrap(), vec!["1 2 3"]);
    }

    #[test]
    fn test_corrupt_heap_count_is_format_error() {
        let header = header(&[
            ("XTENSION", "'BINTABLE'"),
            ("BITPIX", "8"),
            ("NAXIS", "2"),
            ("NAXIS1", "16"),
            ("NAXIS2", "1"),
            ("PCOUNT", "16"),
            ("TFIELDS", "1"),
            ("TTYPE1", "'FLUX'"),
            ("TFORM1", "'1QD'"),
        ]);
        let layout = FitsTableLayout::from_header(&header, TableEncoding::Binary).unwrap();

        let mut row = Vec::new();
        row.extend_from_slice(&(u64::MAX - 1).to_be_bytes());
        row.extend_from_slice(&0u64.to_be_bytes());
        let heap = [0u8; 16];
        let err = layout.decode_row(&row, &heap, 100).unwrap_err();
        assert!(matches!(err, CodecError::Format { .. }));
    }
}
