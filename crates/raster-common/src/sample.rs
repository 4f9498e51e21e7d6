//! Sample types of the host raster model and cell types of the codec.
//!
//! The host side knows more sample types than the codec accepts. Anything
//! the codec cannot take (the complex types) is worked as 32-bit float.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-pixel sample type of a host raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
    CInt16,
    CInt32,
    CFloat32,
    CFloat64,
}

impl SampleType {
    /// Size of one sample in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            SampleType::UInt8 | SampleType::Int8 => 1,
            SampleType::UInt16 | SampleType::Int16 => 2,
            SampleType::UInt32 | SampleType::Int32 | SampleType::Float32 | SampleType::CInt16 => 4,
            SampleType::Float64 | SampleType::CInt32 | SampleType::CFloat32 => 8,
            SampleType::CFloat64 => 16,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            SampleType::CInt16 | SampleType::CInt32 | SampleType::CFloat32 | SampleType::CFloat64
        )
    }

    /// Canonical name, as accepted by `from_name`.
    pub fn name(&self) -> &'static str {
        match self {
            SampleType::UInt8 => "Byte",
            SampleType::Int8 => "Int8",
            SampleType::UInt16 => "UInt16",
            SampleType::Int16 => "Int16",
            SampleType::UInt32 => "UInt32",
            SampleType::Int32 => "Int32",
            SampleType::Float32 => "Float32",
            SampleType::Float64 => "Float64",
            SampleType::CInt16 => "CInt16",
            SampleType::CInt32 => "CInt32",
            SampleType::CFloat32 => "CFloat32",
            SampleType::CFloat64 => "CFloat64",
        }
    }

    /// Parse a type name (case-insensitive). "UInt8" is accepted for "Byte".
    pub fn from_name(s: &str) -> Option<Self> {
        let t = match s.to_lowercase().as_str() {
            "byte" | "uint8" => SampleType::UInt8,
            "int8" => SampleType::Int8,
            "uint16" => SampleType::UInt16,
            "int16" => SampleType::Int16,
            "uint32" => SampleType::UInt32,
            "int32" => SampleType::Int32,
            "float32" => SampleType::Float32,
            "float64" => SampleType::Float64,
            "cint16" => SampleType::CInt16,
            "cint32" => SampleType::CInt32,
            "cfloat32" => SampleType::CFloat32,
            "cfloat64" => SampleType::CFloat64,
            _ => return None,
        };
        Some(t)
    }

    /// Read sample `index` from a native-endian buffer as f64.
    ///
    /// Complex samples yield their real part.
    pub fn read_f64(&self, buf: &[u8], index: usize) -> f64 {
        let off = index * self.size_bytes();
        match self {
            SampleType::UInt8 => buf[off] as f64,
            SampleType::Int8 => buf[off] as i8 as f64,
            SampleType::UInt16 => u16::from_ne_bytes([buf[off], buf[off + 1]]) as f64,
            SampleType::Int16 | SampleType::CInt16 => {
                i16::from_ne_bytes([buf[off], buf[off + 1]]) as f64
            }
            SampleType::UInt32 => u32::from_ne_bytes(word4(buf, off)) as f64,
            SampleType::Int32 | SampleType::CInt32 => i32::from_ne_bytes(word4(buf, off)) as f64,
            SampleType::Float32 | SampleType::CFloat32 => f32::from_ne_bytes(word4(buf, off)) as f64,
            SampleType::Float64 | SampleType::CFloat64 => f64::from_ne_bytes(word8(buf, off)),
        }
    }

    /// Write `value` as sample `index` into a native-endian buffer.
    ///
    /// Integer targets saturate; NaN becomes zero. Complex targets get a zero
    /// imaginary part.
    pub fn write_f64(&self, buf: &mut [u8], index: usize, value: f64) {
        let off = index * self.size_bytes();
        match self {
            SampleType::UInt8 => buf[off] = value as u8,
            SampleType::Int8 => buf[off] = (value as i8) as u8,
            SampleType::UInt16 => buf[off..off + 2].copy_from_slice(&(value as u16).to_ne_bytes()),
            SampleType::Int16 => buf[off..off + 2].copy_from_slice(&(value as i16).to_ne_bytes()),
            SampleType::UInt32 => buf[off..off + 4].copy_from_slice(&(value as u32).to_ne_bytes()),
            SampleType::Int32 => buf[off..off + 4].copy_from_slice(&(value as i32).to_ne_bytes()),
            SampleType::Float32 => buf[off..off + 4].copy_from_slice(&(value as f32).to_ne_bytes()),
            SampleType::Float64 => buf[off..off + 8].copy_from_slice(&value.to_ne_bytes()),
            SampleType::CInt16 => {
                buf[off..off + 2].copy_from_slice(&(value as i16).to_ne_bytes());
                buf[off + 2..off + 4].fill(0);
            }
            SampleType::CInt32 => {
                buf[off..off + 4].copy_from_slice(&(value as i32).to_ne_bytes());
                buf[off + 4..off + 8].fill(0);
            }
            SampleType::CFloat32 => {
                buf[off..off + 4].copy_from_slice(&(value as f32).to_ne_bytes());
                buf[off + 4..off + 8].copy_from_slice(&0f32.to_ne_bytes());
            }
            SampleType::CFloat64 => {
                buf[off..off + 8].copy_from_slice(&value.to_ne_bytes());
                buf[off + 8..off + 16].copy_from_slice(&0f64.to_ne_bytes());
            }
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn word4(buf: &[u8], off: usize) -> [u8; 4] {
    [buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]
}

fn word8(buf: &[u8], off: usize) -> [u8; 8] {
    let mut w = [0u8; 8];
    w.copy_from_slice(&buf[off..off + 8]);
    w
}

/// Convert `count` samples from `src` (of `src_type`) into `dst` (of `dst_type`).
///
/// Same-type conversion is a plain copy.
pub fn convert_row(
    src: &[u8],
    src_type: SampleType,
    dst: &mut [u8],
    dst_type: SampleType,
    count: usize,
) {
    if src_type == dst_type {
        let n = count * src_type.size_bytes();
        dst[..n].copy_from_slice(&src[..n]);
        return;
    }
    for i in 0..count {
        dst_type.write_f64(dst, i, src_type.read_f64(src, i));
    }
}

/// Cell types accepted by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Ieee4,
    Ieee8,
}

impl CellType {
    /// Map a host sample type to the codec cell type plus the sample type the
    /// pixels must be worked in. Complex types are coerced to `Float32`.
    pub fn for_sample_type(sample_type: SampleType) -> (CellType, SampleType) {
        match sample_type {
            SampleType::UInt8 => (CellType::UInt8, SampleType::UInt8),
            SampleType::Int8 => (CellType::Int8, SampleType::Int8),
            SampleType::UInt16 => (CellType::UInt16, SampleType::UInt16),
            SampleType::Int16 => (CellType::Int16, SampleType::Int16),
            SampleType::UInt32 => (CellType::UInt32, SampleType::UInt32),
            SampleType::Int32 => (CellType::Int32, SampleType::Int32),
            SampleType::Float32 => (CellType::Ieee4, SampleType::Float32),
            SampleType::Float64 => (CellType::Ieee8, SampleType::Float64),
            SampleType::CInt16
            | SampleType::CInt32
            | SampleType::CFloat32
            | SampleType::CFloat64 => (CellType::Ieee4, SampleType::Float32),
        }
    }

    /// The host sample type with the same layout.
    pub fn sample_type(&self) -> SampleType {
        match self {
            CellType::UInt8 => SampleType::UInt8,
            CellType::Int8 => SampleType::Int8,
            CellType::UInt16 => SampleType::UInt16,
            CellType::Int16 => SampleType::Int16,
            CellType::UInt32 => SampleType::UInt32,
            CellType::Int32 => SampleType::Int32,
            CellType::Ieee4 => SampleType::Float32,
            CellType::Ieee8 => SampleType::Float64,
        }
    }

    pub fn bits(&self) -> u8 {
        (self.sample_type().size_bytes() * 8) as u8
    }

    /// Floating point cells count as signed.
    pub fn is_signed(&self) -> bool {
        !matches!(self, CellType::UInt8 | CellType::UInt16 | CellType::UInt32)
    }
}
