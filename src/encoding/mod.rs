// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Byte-level decoding shared by the FITS and VOTable paths.
//!
//! - [`field_codec`] - Pure byte range to cell text conversion
//! - [`binary_stream`] - Resumable BINARY/BINARY2 stream decoder
//! - [`base64`] - Incremental base64 for inline streams

pub mod base64;
pub mod binary_stream;
pub mod field_codec;

pub use self::base64::Base64StreamDecoder;
pub use binary_stream::{
    BinaryFlavor, BinaryStreamDecoder, ColumnLayout, DecoderState, Extent, FeedStatus,
};
pub use field_codec::{
    decode_ascii_cell, decode_scalar, decode_vector, AsciiFormat, Precision, Scaling, TypeCode,
    ValueFormat, TRUNCATION_MARK,
};
