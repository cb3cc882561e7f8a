// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Byte-level field decoding for FITS BINTABLE and VOTable BINARY payloads.
//!
//! All functions here are pure: they turn a byte range into the string form
//! of a cell. Binary layouts are big-endian in both formats.
//!
//! # Scaling
//!
//! `value * scale + zero` is applied when either differs from identity.
//! Integer columns stay integral when both coefficients are integral (the
//! common `TZERO = 32768` unsigned-short idiom), otherwise the result is
//! rendered as a float.
//!
//! # Nulls
//!
//! A cell is null (empty string) when its raw integer equals the declared
//! sentinel before scaling, when a float is NaN, or when the FITS ASCII text
//! matches `TNULLn`. The BINARY2 null mask is handled by the stream decoder.

use std::sync::OnceLock;

use byteorder::{BigEndian, ByteOrder};
use regex::Regex;

use crate::core::DataType;
use crate::{CodecError, Result};

/// Marker appended to array cells cut at the element cap.
pub const TRUNCATION_MARK: &str = " ...";

/// Binary element type, keyed by its FITS TFORM letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    /// `L`
    Logical,
    /// `X`
    Bit,
    /// `B`
    UnsignedByte,
    /// `I`
    Short,
    /// `J`
    Int,
    /// `K`
    Long,
    /// `A`
    Char,
    /// `U` (VOTable unicodeChar, UCS-2)
    UnicodeChar,
    /// `E`
    Float,
    /// `D`
    Double,
    /// `C`
    FloatComplex,
    /// `M`
    DoubleComplex,
    /// Anything else; decoded one byte per element
    Unknown(char),
}

impl TypeCode {
    /// Map a FITS TFORM type letter.
    pub fn from_tform(code: char) -> Self {
        match code.to_ascii_uppercase() {
            'L' => TypeCode::Logical,
            'X' => TypeCode::Bit,
            'B' => TypeCode::UnsignedByte,
            'I' => TypeCode::Short,
            'J' => TypeCode::Int,
            'K' => TypeCode::Long,
            'A' => TypeCode::Char,
            'U' => TypeCode::UnicodeChar,
            'E' => TypeCode::Float,
            'D' => TypeCode::Double,
            'C' => TypeCode::FloatComplex,
            'M' => TypeCode::DoubleComplex,
            other => TypeCode::Unknown(other),
        }
    }

    /// Map a declared VOTable datatype.
    pub fn from_datatype(datatype: DataType) -> Self {
        match datatype {
            DataType::Logical => TypeCode::Logical,
            DataType::Bit => TypeCode::Bit,
            DataType::UnsignedByte => TypeCode::UnsignedByte,
            DataType::Short => TypeCode::Short,
            DataType::Int => TypeCode::Int,
            DataType::Long => TypeCode::Long,
            DataType::Char => TypeCode::Char,
            DataType::UnicodeChar => TypeCode::UnicodeChar,
            DataType::Float => TypeCode::Float,
            DataType::Double => TypeCode::Double,
            DataType::FloatComplex => TypeCode::FloatComplex,
            DataType::DoubleComplex => TypeCode::DoubleComplex,
        }
    }

    /// Size in bytes of one element (bit fields report 1, see [`TypeCode::span`]).
    pub fn element_size(&self) -> usize {
        match self {
            TypeCode::Logical
            | TypeCode::Bit
            | TypeCode::UnsignedByte
            | TypeCode::Char
            | TypeCode::Unknown(_) => 1,
            TypeCode::Short | TypeCode::UnicodeChar => 2,
            TypeCode::Int | TypeCode::Float => 4,
            TypeCode::Long | TypeCode::Double | TypeCode::FloatComplex => 8,
            TypeCode::DoubleComplex => 16,
        }
    }

    /// Bytes occupied by `count` elements, `None` when the size overflows.
    pub fn span(&self, count: usize) -> Option<usize> {
        match self {
            TypeCode::Bit => Some(count.div_ceil(8)),
            _ => count.checked_mul(self.element_size()),
        }
    }

    /// [`TypeCode::span`] as a format error for `context`.
    pub fn checked_span(&self, count: usize, context: &str) -> Result<usize> {
        self.span(count).ok_or_else(|| {
            CodecError::format(
                context,
                format!(
                    "{count} elements of type '{}' overflow the addressable size",
                    self.tform_code()
                ),
            )
        })
    }

    /// Whether this code decodes integers.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeCode::UnsignedByte | TypeCode::Short | TypeCode::Int | TypeCode::Long
        )
    }

    /// Whether values are text rather than numbers.
    pub fn is_text(&self) -> bool {
        matches!(self, TypeCode::Char | TypeCode::UnicodeChar)
    }

    /// FITS TFORM letter.
    pub fn tform_code(&self) -> char {
        match self {
            TypeCode::Logical => 'L',
            TypeCode::Bit => 'X',
            TypeCode::UnsignedByte => 'B',
            TypeCode::Short => 'I',
            TypeCode::Int => 'J',
            TypeCode::Long => 'K',
            TypeCode::Char => 'A',
            TypeCode::UnicodeChar => 'U',
            TypeCode::Float => 'E',
            TypeCode::Double => 'D',
            TypeCode::FloatComplex => 'C',
            TypeCode::DoubleComplex => 'M',
            TypeCode::Unknown(c) => *c,
        }
    }
}

/// Linear rescaling `value * scale + zero`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub scale: f64,
    pub zero: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            scale: 1.0,
            zero: 0.0,
        }
    }
}

impl Scaling {
    pub fn new(scale: f64, zero: f64) -> Self {
        Self { scale, zero }
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.zero == 0.0
    }

    /// Both coefficients are whole numbers, so integer data stays integral.
    pub fn is_integral(&self) -> bool {
        self.scale.fract() == 0.0
            && self.zero.fract() == 0.0
            && self.scale.abs() < 9.0e15
            && self.zero.abs() < 9.0e18
    }

    pub fn apply(&self, value: f64) -> f64 {
        if self.is_identity() {
            value
        } else {
            value * self.scale + self.zero
        }
    }
}

/// Output precision for floating point cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Digits after the decimal point
    Decimals(usize),
    /// Significant digits, exponential notation
    Significant(usize),
}

fn tdisp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z]{1,2})(\d+)?(?:\.(\d+))?").expect("valid TDISP pattern")
    })
}

impl Precision {
    /// Parse a VOTable `precision` attribute (`"3"`, `"F3"`, `"E5"`).
    pub fn parse_votable(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix(['E', 'e']) {
            return rest.parse().ok().map(Precision::Significant);
        }
        let rest = text.strip_prefix(['F', 'f']).unwrap_or(text);
        rest.parse().ok().map(Precision::Decimals)
    }

    /// Parse the fractional part of a FITS `TDISPn` format (`F10.3`, `E12.5`, `G8.3`).
    pub fn parse_tdisp(text: &str) -> Option<Self> {
        let caps = tdisp_regex().captures(text)?;
        let code = caps.get(1)?.as_str().to_ascii_uppercase();
        let decimals: usize = caps.get(3)?.as_str().parse().ok()?;
        match code.chars().next()? {
            'F' => Some(Precision::Decimals(decimals)),
            'E' | 'D' | 'G' => Some(Precision::Significant(decimals)),
            _ => None,
        }
    }

    /// Render a value.
    pub fn format(&self, value: f64) -> String {
        match *self {
            Precision::Decimals(d) => format!("{value:.d$}"),
            Precision::Significant(d) => format!("{value:.d$e}"),
        }
    }
}

/// How to render the cells of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueFormat {
    pub precision: Option<Precision>,
    pub scaling: Scaling,
    /// Integer null sentinel, compared before scaling
    pub null: Option<i64>,
}

impl ValueFormat {
    pub fn with_precision(mut self, precision: Option<Precision>) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_null(mut self, null: Option<i64>) -> Self {
        self.null = null;
        self
    }
}

fn ensure(bytes: &[u8], offset: usize, needed: usize) -> Result<()> {
    let available = bytes.len().saturating_sub(offset);
    if available < needed {
        return Err(CodecError::buffer_too_short(needed, available, offset));
    }
    Ok(())
}

/// Decode a single value starting at `offset`.
pub fn decode_scalar(
    bytes: &[u8],
    offset: usize,
    type_code: TypeCode,
    format: &ValueFormat,
) -> Result<String> {
    match type_code {
        TypeCode::Char => decode_chars(bytes, offset, 1),
        TypeCode::UnicodeChar => decode_unicode(bytes, offset, 1),
        TypeCode::Bit => decode_bits(bytes, offset, 1, usize::MAX),
        _ => decode_element(bytes, offset, type_code, format),
    }
}

/// Decode `count` consecutive values starting at `offset`.
///
/// Numbers are space-joined. Text types yield one trimmed string. At most
/// `max_elements` numbers are decoded; longer arrays end with
/// [`TRUNCATION_MARK`].
pub fn decode_vector(
    bytes: &[u8],
    offset: usize,
    count: usize,
    type_code: TypeCode,
    format: &ValueFormat,
    max_elements: usize,
) -> Result<String> {
    match type_code {
        TypeCode::Char => decode_chars(bytes, offset, count),
        TypeCode::UnicodeChar => decode_unicode(bytes, offset, count),
        TypeCode::Bit => decode_bits(bytes, offset, count, max_elements),
        _ => {
            ensure(bytes, offset, type_code.checked_span(count, "array")?)?;
            let size = type_code.element_size();
            let shown = count.min(max_elements);
            let mut parts = Vec::with_capacity(shown);
            for i in 0..shown {
                parts.push(decode_element(bytes, offset + i * size, type_code, format)?);
            }
            let mut text = parts.join(" ");
            if count > shown {
                text.push_str(TRUNCATION_MARK);
            }
            Ok(text)
        }
    }
}

fn decode_element(
    bytes: &[u8],
    offset: usize,
    type_code: TypeCode,
    format: &ValueFormat,
) -> Result<String> {
    let size = type_code.element_size();
    ensure(bytes, offset, size)?;
    let b = &bytes[offset..offset + size];
    let text = match type_code {
        TypeCode::Logical => match b[0] {
            b'T' | b't' | b'1' => "T".to_string(),
            b'F' | b'f' | b'0' => "F".to_string(),
            _ => String::new(),
        },
        TypeCode::UnsignedByte => integer_text(b[0] as i64, format),
        TypeCode::Short => integer_text(BigEndian::read_i16(b) as i64, format),
        TypeCode::Int => integer_text(BigEndian::read_i32(b) as i64, format),
        TypeCode::Long => integer_text(BigEndian::read_i64(b), format),
        TypeCode::Float => float_text(BigEndian::read_f32(b) as f64, format, true),
        TypeCode::Double => float_text(BigEndian::read_f64(b), format, false),
        TypeCode::FloatComplex => complex_text(
            BigEndian::read_f32(&b[..4]) as f64,
            BigEndian::read_f32(&b[4..]) as f64,
            format,
            true,
        ),
        TypeCode::DoubleComplex => complex_text(
            BigEndian::read_f64(&b[..8]),
            BigEndian::read_f64(&b[8..]),
            format,
            false,
        ),
        TypeCode::Unknown(_) | TypeCode::Bit => b[0].to_string(),
        TypeCode::Char => return decode_chars(bytes, offset, 1),
        TypeCode::UnicodeChar => return decode_unicode(bytes, offset, 1),
    };
    Ok(text)
}

/// Render a raw integer, honouring the null sentinel and scaling.
pub fn integer_text(raw: i64, format: &ValueFormat) -> String {
    if format.null == Some(raw) {
        return String::new();
    }
    let scaling = format.scaling;
    if scaling.is_identity() {
        return raw.to_string();
    }
    if scaling.is_integral() && format.precision.is_none() {
        let value = raw as i128 * scaling.scale as i128 + scaling.zero as i128;
        return value.to_string();
    }
    render_float(scaling.apply(raw as f64), format.precision, false)
}

fn float_text(value: f64, format: &ValueFormat, single: bool) -> String {
    if value.is_nan() {
        return String::new();
    }
    if format.scaling.is_identity() {
        render_float(value, format.precision, single)
    } else {
        render_float(format.scaling.apply(value), format.precision, false)
    }
}

fn complex_text(re: f64, im: f64, format: &ValueFormat, single: bool) -> String {
    if re.is_nan() || im.is_nan() {
        return String::new();
    }
    format!(
        "{},{}",
        render_float(re, format.precision, single),
        render_float(im, format.precision, single)
    )
}

fn render_float(value: f64, precision: Option<Precision>, single: bool) -> String {
    match precision {
        Some(p) => p.format(value),
        None if single => (value as f32).to_string(),
        None => value.to_string(),
    }
}

fn decode_chars(bytes: &[u8], offset: usize, count: usize) -> Result<String> {
    ensure(bytes, offset, count)?;
    let raw = &bytes[offset..offset + count];
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).trim().to_string())
}

fn decode_unicode(bytes: &[u8], offset: usize, count: usize) -> Result<String> {
    let span = TypeCode::UnicodeChar.checked_span(count, "unicodeChar")?;
    ensure(bytes, offset, span)?;
    let mut text = String::with_capacity(count);
    for unit in bytes[offset..offset + span].chunks_exact(2) {
        let code = BigEndian::read_u16(unit) as u32;
        if code == 0 {
            break;
        }
        text.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    Ok(text.trim().to_string())
}

fn decode_bits(bytes: &[u8], offset: usize, count: usize, max_elements: usize) -> Result<String> {
    ensure(bytes, offset, count.div_ceil(8))?;
    let shown = count.min(max_elements);
    let mut text: String = (0..shown)
        .map(|i| {
            let byte = bytes[offset + i / 8];
            if byte & (0x80 >> (i % 8)) != 0 {
                '1'
            } else {
                '0'
            }
        })
        .collect();
    if count > shown {
        text.push_str(TRUNCATION_MARK);
    }
    Ok(text)
}

/// Column format of a FITS ASCII table (`TFORMn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsciiFormat {
    /// `Aw`
    Char(usize),
    /// `Iw`
    Int(usize),
    /// `Fw.d`
    Fixed(usize, usize),
    /// `Ew.d`
    Exponential(usize, usize),
    /// `Dw.d`
    DoubleExponential(usize, usize),
}

fn ascii_tform_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([AIFEDaifed])(\d+)(?:\.(\d+))?\s*$").expect("valid TFORM pattern")
    })
}

impl AsciiFormat {
    /// Parse an ASCII-table TFORM value.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = ascii_tform_regex().captures(text)?;
        let width: usize = caps.get(2)?.as_str().parse().ok()?;
        let decimals: usize = caps
            .get(3)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        let code = caps.get(1)?.as_str().to_ascii_uppercase();
        let format = match code.as_str() {
            "A" => AsciiFormat::Char(width),
            "I" => AsciiFormat::Int(width),
            "F" => AsciiFormat::Fixed(width, decimals),
            "E" => AsciiFormat::Exponential(width, decimals),
            _ => AsciiFormat::DoubleExponential(width, decimals),
        };
        Some(format)
    }

    /// Field width in characters.
    pub fn width(&self) -> usize {
        match self {
            AsciiFormat::Char(w) | AsciiFormat::Int(w) => *w,
            AsciiFormat::Fixed(w, _)
            | AsciiFormat::Exponential(w, _)
            | AsciiFormat::DoubleExponential(w, _) => *w,
        }
    }

    fn decimals(&self) -> usize {
        match self {
            AsciiFormat::Fixed(_, d)
            | AsciiFormat::Exponential(_, d)
            | AsciiFormat::DoubleExponential(_, d) => *d,
            _ => 0,
        }
    }
}

/// Decode one FITS ASCII-table cell.
///
/// `null` is compared against the trimmed text. Real numbers written
/// without a decimal point get the implied decimals of `Fw.d`/`Ew.d`.
pub fn decode_ascii_cell(
    raw: &[u8],
    format: AsciiFormat,
    value_format: &ValueFormat,
    null: Option<&str>,
) -> String {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if null.is_some_and(|n| n.trim() == trimmed) {
        return String::new();
    }
    match format {
        AsciiFormat::Char(_) => trimmed.to_string(),
        AsciiFormat::Int(_) => {
            if value_format.scaling.is_identity() {
                return trimmed.to_string();
            }
            match trimmed.parse::<i64>() {
                Ok(raw) => integer_text(raw, &ValueFormat { null: None, ..*value_format }),
                Err(_) => trimmed.to_string(),
            }
        }
        _ => {
            let normalized = trimmed.replace(['D', 'd'], "E");
            let Ok(mut value) = normalized.parse::<f64>() else {
                return trimmed.to_string();
            };
            let mantissa = normalized.split(['E', 'e']).next().unwrap_or("");
            if !mantissa.contains('.') && format.decimals() > 0 {
                value /= 10f64.powi(format.decimals() as i32);
            } else if value_format.scaling.is_identity() && value_format.precision.is_none() {
                return normalized;
            }
            render_float(
                value_format.scaling.apply(value),
                value_format.precision,
                false,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_spans() {
        assert_eq!(TypeCode::from_tform('J').span(3), Some(12));
        assert_eq!(TypeCode::from_tform('X').span(9), Some(2));
        assert_eq!(TypeCode::from_tform('M').span(1), Some(16));
        assert_eq!(TypeCode::from_tform('Z'), TypeCode::Unknown('Z'));
        assert_eq!(TypeCode::Unknown('Z').span(5), Some(5));
        assert_eq!(TypeCode::Double.span(usize::MAX / 4), None);
    }

    #[test]
    fn test_oversized_vector_is_format_error() {
        let bytes = [0u8; 64];
        let format = ValueFormat::default();
        let err =
            decode_vector(&bytes, 0, usize::MAX / 4, TypeCode::Double, &format, 10).unwrap_err();
        assert!(matches!(err, CodecError::Format { .. }));
        let err =
            decode_vector(&bytes, 0, usize::MAX, TypeCode::UnicodeChar, &format, 10).unwrap_err();
        assert!(matches!(err, CodecError::Format { .. }));
    }

    #[test]
    fn test_decode_short_round_trip_with_scaling() {
        // Unsigned 16-bit value stored with TZERO = 32768
        let stored: i16 = (40000i32 - 32768) as i16;
        let bytes = stored.to_be_bytes();
        let format = ValueFormat::default().with_scaling(Scaling::new(1.0, 32768.0));
        assert_eq!(
            decode_scalar(&bytes, 0, TypeCode::Short, &format).unwrap(),
            "40000"
        );
    }

    #[test]
    fn test_decode_int_with_fractional_scale() {
        let bytes = 1234i32.to_be_bytes();
        let format = ValueFormat::default().with_scaling(Scaling::new(0.01, 0.0));
        let text = decode_scalar(&bytes, 0, TypeCode::Int, &format).unwrap();
        let value: f64 = text.parse().unwrap();
        assert!((value - 12.34).abs() < 1e-9);
    }

    #[test]
    fn test_decode_float_round_trip() {
        let bytes = 188.725f32.to_be_bytes();
        let text = decode_scalar(&bytes, 0, TypeCode::Float, &ValueFormat::default()).unwrap();
        assert_eq!(text, "188.725");

        let bytes = (-1.0340123456789f64).to_be_bytes();
        let text = decode_scalar(&bytes, 0, TypeCode::Double, &ValueFormat::default()).unwrap();
        assert_eq!(text.parse::<f64>().unwrap(), -1.0340123456789);
    }

    #[test]
    fn test_decode_with_precision() {
        let bytes = 3.14159f64.to_be_bytes();
        let format = ValueFormat::default().with_precision(Some(Precision::Decimals(2)));
        assert_eq!(decode_scalar(&bytes, 0, TypeCode::Double, &format).unwrap(), "3.14");
    }

    #[test]
    fn test_integer_null_sentinel() {
        let bytes = (-999i32).to_be_bytes();
        let format = ValueFormat::default().with_null(Some(-999));
        assert_eq!(decode_scalar(&bytes, 0, TypeCode::Int, &format).unwrap(), "");
    }

    #[test]
    fn test_nan_is_null() {
        let bytes = f64::NAN.to_be_bytes();
        assert_eq!(
            decode_scalar(&bytes, 0, TypeCode::Double, &ValueFormat::default()).unwrap(),
            ""
        );
    }

    #[test]
    fn test_decode_chars_trimmed() {
        let bytes = b"  M31 \0\0xx";
        assert_eq!(
            decode_vector(bytes, 0, 8, TypeCode::Char, &ValueFormat::default(), 10).unwrap(),
            "M31"
        );
    }

    #[test]
    fn test_decode_unicode() {
        let bytes = [0x00, 0x41, 0x03, 0xB1, 0x00, 0x00];
        assert_eq!(
            decode_vector(&bytes, 0, 3, TypeCode::UnicodeChar, &ValueFormat::default(), 10)
                .unwrap(),
            "Aα"
        );
    }

    #[test]
    fn test_decode_bits() {
        let bytes = [0b1010_0000, 0b1000_0000];
        assert_eq!(
            decode_vector(&bytes, 0, 9, TypeCode::Bit, &ValueFormat::default(), 100).unwrap(),
            "101000001"
        );
    }

    #[test]
    fn test_decode_logical() {
        let format = ValueFormat::default();
        assert_eq!(decode_scalar(b"T", 0, TypeCode::Logical, &format).unwrap(), "T");
        assert_eq!(decode_scalar(b"F", 0, TypeCode::Logical, &format).unwrap(), "F");
        assert_eq!(decode_scalar(b"\0", 0, TypeCode::Logical, &format).unwrap(), "");
    }

    #[test]
    fn test_vector_truncated_at_cap() {
        let mut bytes = Vec::new();
        for v in 1i16..=5 {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        let text =
            decode_vector(&bytes, 0, 5, TypeCode::Short, &ValueFormat::default(), 3).unwrap();
        assert_eq!(text, "1 2 3 ...");
    }

    #[test]
    fn test_unknown_type_one_byte_per_element() {
        let text =
            decode_vector(&[7, 8], 0, 2, TypeCode::Unknown('Q'), &ValueFormat::default(), 10)
                .unwrap();
        assert_eq!(text, "7 8");
    }

    #[test]
    fn test_buffer_too_short() {
        let err = decode_scalar(&[0, 1], 0, TypeCode::Int, &ValueFormat::default()).unwrap_err();
        assert!(matches!(err, CodecError::BufferTooShort { .. }));
    }

    #[test]
    fn test_complex() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f32.to_be_bytes());
        bytes.extend_from_slice(&(-2.0f32).to_be_bytes());
        assert_eq!(
            decode_scalar(&bytes, 0, TypeCode::FloatComplex, &ValueFormat::default()).unwrap(),
            "1.5,-2"
        );
    }

    #[test]
    fn test_precision_parsing() {
        assert_eq!(Precision::parse_votable("3"), Some(Precision::Decimals(3)));
        assert_eq!(Precision::parse_votable("F4"), Some(Precision::Decimals(4)));
        assert_eq!(Precision::parse_votable("E5"), Some(Precision::Significant(5)));
        assert_eq!(Precision::parse_tdisp("F10.3"), Some(Precision::Decimals(3)));
        assert_eq!(Precision::parse_tdisp("E12.5"), Some(Precision::Significant(5)));
        assert_eq!(Precision::parse_tdisp("I6"), None);
    }

    #[test]
    fn test_ascii_format_parse() {
        assert_eq!(AsciiFormat::parse("A10"), Some(AsciiFormat::Char(10)));
        assert_eq!(AsciiFormat::parse("I6"), Some(AsciiFormat::Int(6)));
        assert_eq!(AsciiFormat::parse("F8.3"), Some(AsciiFormat::Fixed(8, 3)));
        assert_eq!(AsciiFormat::parse("D25.17"), Some(AsciiFormat::DoubleExponential(25, 17)));
        assert_eq!(AsciiFormat::parse("Q3"), None);
    }

    #[test]
    fn test_ascii_cells() {
        let vf = ValueFormat::default();
        assert_eq!(decode_ascii_cell(b"  12.5 ", AsciiFormat::Fixed(7, 1), &vf, None), "12.5");
        assert_eq!(
            decode_ascii_cell(b"1.0D+02", AsciiFormat::DoubleExponential(7, 1), &vf, None),
            "1.0E+02"
        );
        assert_eq!(decode_ascii_cell(b" 1250", AsciiFormat::Fixed(5, 2), &vf, None), "12.5");
        assert_eq!(decode_ascii_cell(b"  -99", AsciiFormat::Int(5), &vf, Some("-99")), "");
        let scaled = ValueFormat::default().with_scaling(Scaling::new(2.0, 1.0));
        assert_eq!(decode_ascii_cell(b"   10", AsciiFormat::Int(5), &scaled, None), "21");
    }
}
