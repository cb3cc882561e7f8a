// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Streaming binary decoder tests through the public API.

use std::ops::ControlFlow;

use astrocodec::encoding::{
    decode_scalar, BinaryFlavor, BinaryStreamDecoder, DecoderState, FeedStatus, TypeCode,
    ValueFormat,
};
use astrocodec::{ArraySize, DataType, Field};

fn fields() -> Vec<Field> {
    vec![
        Field::new("flag").with_datatype(DataType::Logical),
        Field::new("mag").with_datatype(DataType::Float),
        Field::new("pos")
            .with_datatype(DataType::Double)
            .with_array_size(ArraySize::Fixed(2)),
        Field::new("label")
            .with_datatype(DataType::Char)
            .with_array_size(ArraySize::Variable { max: None }),
    ]
}

fn row(out: &mut Vec<u8>, flag: u8, mag: f32, pos: [f64; 2], label: &str) {
    out.push(0);
    out.push(flag);
    out.extend_from_slice(&mag.to_be_bytes());
    for v in pos {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.extend_from_slice(&(label.len() as u32).to_be_bytes());
    out.extend_from_slice(label.as_bytes());
}

fn decode(chunks: &[&[u8]]) -> Vec<Vec<String>> {
    let decoder = BinaryStreamDecoder::new(BinaryFlavor::Binary2, 100);
    let mut state = DecoderState::from_fields(&fields()).unwrap();
    let mut records = Vec::new();
    for chunk in chunks {
        let status = decoder
            .feed(&mut state, chunk, |record| {
                records.push(record);
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(status, FeedStatus::NeedMore);
    }
    assert_eq!(decoder.finish(&mut state), 0);
    records
}

#[test]
fn test_records_independent_of_chunking() {
    let mut payload = Vec::new();
    row(&mut payload, b'T', 12.5, [10.0, -20.0], "first");
    row(&mut payload, b'F', -1.25, [350.5, 89.0], "");
    row(&mut payload, b'?', 0.0, [0.0, 0.0], "third one");

    let whole = decode(&[&payload]);
    assert_eq!(whole.len(), 3);
    assert_eq!(whole[0][0], "T");
    assert_eq!(whole[2][3], "third one");

    for size in [1, 2, 3, 5, 7, 13, 64] {
        let chunks: Vec<&[u8]> = payload.chunks(size).collect();
        assert_eq!(decode(&chunks), whole, "chunk size {size}");
    }
}

#[test]
fn test_scalar_decoding_of_big_endian_values() {
    let format = ValueFormat::default();
    assert_eq!(
        decode_scalar(&(-42i32).to_be_bytes(), 0, TypeCode::Int, &format).unwrap(),
        "-42"
    );
    assert_eq!(
        decode_scalar(&1.5f64.to_be_bytes(), 0, TypeCode::Double, &format).unwrap(),
        "1.5"
    );
    assert!(decode_scalar(&[0u8; 2], 0, TypeCode::Int, &format).is_err());
}
