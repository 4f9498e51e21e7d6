//! Tests for sample conversion between host and codec types.

use raster_common::{convert_row, CellType, EncodeError, SampleType};

// ============================================================================
// Row conversion
// ============================================================================

#[test]
fn test_same_type_is_copy() {
    let src = vec![1u8, 2, 3, 4, 5, 6];
    let mut dst = vec![0u8; 6];
    convert_row(&src, SampleType::Int16, &mut dst, SampleType::Int16, 3);
    assert_eq!(src, dst);
}

#[test]
fn test_uint8_to_float32() {
    let src = vec![0u8, 128, 255];
    let mut dst = vec![0u8; 12];
    convert_row(&src, SampleType::UInt8, &mut dst, SampleType::Float32, 3);
    let values: Vec<f32> = dst
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(values, vec![0.0, 128.0, 255.0]);
}

#[test]
fn test_complex_to_working_type_keeps_real_part() {
    let (cell, work) = CellType::for_sample_type(SampleType::CInt16);
    assert_eq!(cell, CellType::Ieee4);

    let mut src = vec![0u8; 8];
    SampleType::CInt16.write_f64(&mut src, 0, -12.0);
    SampleType::CInt16.write_f64(&mut src, 1, 40.0);

    let mut dst = vec![0u8; 8];
    convert_row(&src, SampleType::CInt16, &mut dst, work, 2);
    assert_eq!(work.read_f64(&dst, 0), -12.0);
    assert_eq!(work.read_f64(&dst, 1), 40.0);
}

#[test]
fn test_int8_roundtrip_negative() {
    let mut buf = vec![0u8; 1];
    SampleType::Int8.write_f64(&mut buf, 0, -100.0);
    assert_eq!(SampleType::Int8.read_f64(&buf, 0), -100.0);
}

// ============================================================================
// Error taxonomy
// ============================================================================

#[test]
fn test_validation_errors() {
    assert!(EncodeError::configuration("zero bands").is_validation());
    assert!(EncodeError::unsupported_type("CInt16").is_validation());
    assert!(!EncodeError::io("disk full").is_validation());
    assert!(!EncodeError::Cancelled.is_validation());
}

#[test]
fn test_sequencing_message() {
    let err = EncodeError::Sequencing {
        loaded_line: 4,
        line: 6,
        band: 2,
    };
    let msg = err.to_string();
    assert!(msg.contains("loaded line is 4"));
    assert!(msg.contains("line 6 of band 2"));
}

#[test]
fn test_io_error_conversion() {
    let err: EncodeError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err, EncodeError::Io(ref m) if m.contains("gone")));
}
