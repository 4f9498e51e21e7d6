//! The codec seam.
//!
//! A codec session is a single-writer, forward-only log of scanlines: it is
//! configured, opened, appended to line by line, and closed. There is no way
//! to seek or rewrite a line once appended.
//!
//! Data reaches the codec in one of two directions:
//! - **push**: the caller hands over one assembled line at a time through
//!   [`Codec::write_line`];
//! - **pull**: [`Codec::write_all`] asks a [`LineProvider`] for each line in
//!   order, reporting progress and polling for cancellation between lines.
//!
//! Both end in `write_line`, so every line passes the same checks.

pub(crate) mod container;

pub use container::{is_container, ContainerCodec, ContainerHeader, CONTAINER_FORMAT_VERSION};

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::PathBuf;

use raster_common::{CellType, EncodeError, EncodeResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("file I/O error: {0}")]
    Io(String),

    #[error("cancelled")]
    Cancelled,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("{0}")]
    Encode(String),
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::Io(err.to_string())
    }
}

impl From<CodecError> for EncodeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(msg) => EncodeError::Io(msg),
            CodecError::Cancelled => EncodeError::Cancelled,
            CodecError::InvalidParameter(msg) | CodecError::Encode(msg) => EncodeError::Codec(msg),
        }
    }
}

/// Colour interpretation written into the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    Greyscale,
    Srgb,
    Multiband,
}

impl ColorSpace {
    /// 1 band is greyscale, 3 bands are sRGB, anything else is multiband.
    pub fn for_band_count(bands: usize) -> Self {
        match bands {
            1 => ColorSpace::Greyscale,
            3 => ColorSpace::Srgb,
            _ => ColorSpace::Multiband,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellSizeUnits {
    Meters,
    Degrees,
    Feet,
}

/// Per-band descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandInfo {
    pub bits: u8,
    pub signed: bool,
    pub description: String,
}

/// Everything the codec needs to know before it is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub size_x: usize,
    pub size_y: usize,
    pub compression_rate: u32,
    pub cell_size_units: CellSizeUnits,
    pub color_space: ColorSpace,
    pub cell_type: CellType,
    pub bands: Vec<BandInfo>,
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_increment_x: f64,
    pub cell_increment_y: f64,
    pub rotation_degrees: f64,
    pub projection: String,
    pub datum: String,
}

impl FileInfo {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Bytes in one band's row.
    pub fn row_bytes(&self) -> usize {
        self.size_x * self.cell_type.sample_type().size_bytes()
    }
}

/// JPEG2000 compression profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    Baseline0,
    Baseline1,
    Baseline2,
    NitfBiifNpje,
    NitfBiifEpje,
}

impl Profile {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let p = match tag.to_uppercase().as_str() {
            "BASELINE_0" => Profile::Baseline0,
            "BASELINE_1" => Profile::Baseline1,
            "BASELINE_2" => Profile::Baseline2,
            "NPJE" => Profile::NitfBiifNpje,
            "EPJE" => Profile::NitfBiifEpje,
            _ => return None,
        };
        Some(p)
    }
}

/// JPEG2000 progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Progression {
    Lrcp,
    Rlcp,
    Rpcl,
}

impl Progression {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let p = match tag.to_uppercase().as_str() {
            "LRCP" => Progression::Lrcp,
            "RLCP" => Progression::Rlcp,
            "RPCL" => Progression::Rpcl,
            _ => return None,
        };
        Some(p)
    }
}

/// Tuning parameters, applied before the codec is opened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CodecParameter {
    Profile(Profile),
    CodestreamOnly(bool),
    Levels(u32),
    Layers(u32),
    PrecinctWidth(u32),
    PrecinctHeight(u32),
    TileWidth(u32),
    TileHeight(u32),
    IncludeSop(bool),
    IncludeEph(bool),
    Progression(Progression),
    DecompressLayers(u32),
    ReconstructionParameter(f32),
}

/// A byte range of an existing host file, written front to back.
///
/// Writing past `length` bytes fails; the host file is never truncated.
#[derive(Debug)]
pub struct SubfileWindow {
    file: File,
    path: PathBuf,
    offset: u64,
    length: u64,
    written: u64,
}

impl SubfileWindow {
    /// Position `file` at `offset` and wrap it.
    pub fn new(mut file: File, path: PathBuf, offset: u64, length: u64) -> io::Result<Self> {
        file.seek(SeekFrom::Start(offset))?;
        Ok(Self {
            file,
            path,
            offset,
            length,
            written: 0,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Write for SubfileWindow {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.length - self.written;
        if buf.len() as u64 > remaining {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "write of {} bytes exceeds subfile window of {} bytes at offset {}",
                    buf.len(),
                    self.length,
                    self.offset
                ),
            ));
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Where an opened codec writes.
#[derive(Debug)]
pub enum OutputTarget {
    /// A named destination the codec creates itself.
    Path(PathBuf),
    /// A window inside a host file opened by the caller.
    Window(SubfileWindow),
}

/// Supplies lines to [`Codec::write_all`].
pub trait LineProvider {
    fn cell_type(&self) -> CellType;

    fn band_count(&self) -> usize;

    /// Bytes in one band's row.
    fn row_bytes(&self) -> usize;

    fn line_count(&self) -> usize;

    /// Fill `bands[b]` with row `line` of band `b`.
    fn supply_line(&mut self, line: usize, bands: &mut [Vec<u8>]) -> Result<(), CodecError>;

    /// Called after each line with the number of lines completed.
    fn report_progress(&mut self, lines_done: usize);

    /// Polled before each line.
    fn is_cancelled(&self) -> bool;
}

/// A write-once codec session.
pub trait Codec {
    /// Read-only view of a finished destination.
    type Dataset;

    fn set_file_info(&mut self, info: &FileInfo) -> Result<(), CodecError>;

    fn set_parameter(&mut self, parameter: CodecParameter) -> Result<(), CodecError>;

    fn open(&mut self, target: OutputTarget) -> Result<(), CodecError>;

    /// Append the next line. `bands` holds one row per band, in band order.
    fn write_line(&mut self, cell_type: CellType, bands: &[&[u8]]) -> Result<(), CodecError>;

    /// Finish the session. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), CodecError>;

    /// Open a finished destination read-only.
    fn reopen(&self, destination: &str) -> EncodeResult<Self::Dataset>;

    /// Pull every line from `provider`, in order, until done or cancelled.
    fn write_all(&mut self, provider: &mut dyn LineProvider) -> Result<(), CodecError> {
        let mut bands = vec![vec![0u8; provider.row_bytes()]; provider.band_count()];
        let cell_type = provider.cell_type();

        for line in 0..provider.line_count() {
            if provider.is_cancelled() {
                return Err(CodecError::Cancelled);
            }
            provider.supply_line(line, &mut bands)?;
            let rows: Vec<&[u8]> = bands.iter().map(Vec::as_slice).collect();
            self.write_line(cell_type, &rows)?;
            provider.report_progress(line + 1);
        }

        Ok(())
    }
}
