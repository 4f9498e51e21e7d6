//! Reference container codec.
//!
//! Layout, all integers little-endian:
//!
//! ```text
//! magic[4] version[1] header_len[u32] header[json]
//! { compressed_len[u32] zlib(BIL line) crc32(BIL line)[u32] } * lines
//! "END!" line_count[u32]
//! ```
//!
//! The trailer is only written by `close`, so a file from an aborted
//! session cannot be reopened.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use raster_common::{CellType, EncodeResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Codec, CodecError, CodecParameter, FileInfo, OutputTarget};
use crate::dataset::EncodedDataset;
use crate::options::ContainerKind;

pub const CONTAINER_FORMAT_VERSION: u8 = 1;

pub(crate) const TRAILER_MAGIC: &[u8; 4] = b"END!";

/// JSON header stored after the magic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerHeader {
    pub info: FileInfo,
    pub parameters: Vec<CodecParameter>,
}

/// Writes the reference container for one container family.
pub struct ContainerCodec {
    kind: ContainerKind,
    info: Option<FileInfo>,
    parameters: Vec<CodecParameter>,
    sink: Option<Box<dyn Write>>,
    level: u32,
    lines: usize,
    scratch: Vec<u8>,
}

impl ContainerCodec {
    pub fn new(kind: ContainerKind) -> Self {
        Self {
            kind,
            info: None,
            parameters: Vec::new(),
            sink: None,
            level: 6,
            lines: 0,
            scratch: Vec::new(),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn is_open(&self) -> bool {
        self.sink.is_some()
    }

    fn sink(&mut self) -> Result<&mut Box<dyn Write>, CodecError> {
        self.sink
            .as_mut()
            .ok_or_else(|| CodecError::InvalidParameter("codec is not open".to_string()))
    }

    fn write_header(&mut self) -> Result<(), CodecError> {
        let info = self
            .info
            .clone()
            .ok_or_else(|| CodecError::InvalidParameter("file info has not been set".to_string()))?;
        let header = ContainerHeader {
            info,
            parameters: self.parameters.clone(),
        };
        let json = serde_json::to_vec(&header).map_err(|e| CodecError::Encode(e.to_string()))?;

        let magic = self.kind.magic();
        let sink = self.sink()?;
        sink.write_all(magic)?;
        sink.write_all(&[CONTAINER_FORMAT_VERSION])?;
        sink.write_all(&(json.len() as u32).to_le_bytes())?;
        sink.write_all(&json)?;
        Ok(())
    }
}

impl Codec for ContainerCodec {
    type Dataset = EncodedDataset;

    fn set_file_info(&mut self, info: &FileInfo) -> Result<(), CodecError> {
        if self.sink.is_some() {
            return Err(CodecError::InvalidParameter(
                "file info cannot change after open".to_string(),
            ));
        }
        if info.bands.is_empty() || info.size_x == 0 || info.size_y == 0 {
            return Err(CodecError::InvalidParameter(format!(
                "invalid raster size {}x{}x{}",
                info.size_x,
                info.size_y,
                info.bands.len()
            )));
        }
        self.level = info.compression_rate.clamp(1, 9);
        self.info = Some(info.clone());
        Ok(())
    }

    fn set_parameter(&mut self, parameter: CodecParameter) -> Result<(), CodecError> {
        if self.sink.is_some() {
            return Err(CodecError::InvalidParameter(
                "parameters cannot change after open".to_string(),
            ));
        }
        if self.kind != ContainerKind::Jpeg2000 {
            return Err(CodecError::InvalidParameter(format!(
                "{} does not take {:?}",
                self.kind, parameter
            )));
        }
        self.parameters.push(parameter);
        Ok(())
    }

    fn open(&mut self, target: OutputTarget) -> Result<(), CodecError> {
        if self.sink.is_some() {
            return Err(CodecError::InvalidParameter("codec is already open".to_string()));
        }
        if self.info.is_none() {
            return Err(CodecError::InvalidParameter(
                "file info has not been set".to_string(),
            ));
        }

        let sink: Box<dyn Write> = match target {
            OutputTarget::Path(path) => Box::new(BufWriter::new(File::create(&path)?)),
            OutputTarget::Window(window) => Box::new(BufWriter::new(window)),
        };
        self.sink = Some(sink);
        self.lines = 0;

        if let Err(e) = self.write_header() {
            self.sink = None;
            return Err(e);
        }
        Ok(())
    }

    fn write_line(&mut self, cell_type: CellType, bands: &[&[u8]]) -> Result<(), CodecError> {
        let info = self
            .info
            .as_ref()
            .ok_or_else(|| CodecError::InvalidParameter("codec is not open".to_string()))?;
        if cell_type != info.cell_type {
            return Err(CodecError::InvalidParameter(format!(
                "cell type {:?} does not match {:?}",
                cell_type, info.cell_type
            )));
        }
        if bands.len() != info.band_count() {
            return Err(CodecError::InvalidParameter(format!(
                "{} band buffers supplied, {} expected",
                bands.len(),
                info.band_count()
            )));
        }
        let row_bytes = info.row_bytes();
        if let Some(short) = bands.iter().position(|b| b.len() != row_bytes) {
            return Err(CodecError::InvalidParameter(format!(
                "band {} holds {} bytes, {} expected",
                short + 1,
                bands[short].len(),
                row_bytes
            )));
        }
        if self.lines >= info.size_y {
            return Err(CodecError::Encode(format!(
                "line {} is past the last line {}",
                self.lines,
                info.size_y - 1
            )));
        }

        self.scratch.clear();
        for band in bands {
            self.scratch.extend_from_slice(band);
        }
        let crc = crc32fast::hash(&self.scratch);

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(&self.scratch)?;
        let compressed = encoder.finish()?;

        let sink = self.sink()?;
        sink.write_all(&(compressed.len() as u32).to_le_bytes())?;
        sink.write_all(&compressed)?;
        sink.write_all(&crc.to_le_bytes())?;

        self.lines += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CodecError> {
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };
        sink.write_all(TRAILER_MAGIC)?;
        sink.write_all(&(self.lines as u32).to_le_bytes())?;
        sink.flush()?;
        debug!(kind = %self.kind, lines = self.lines, "Container closed");
        Ok(())
    }

    fn reopen(&self, destination: &str) -> EncodeResult<EncodedDataset> {
        EncodedDataset::open(destination)
    }
}

impl std::fmt::Debug for ContainerCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerCodec")
            .field("kind", &self.kind)
            .field("open", &self.sink.is_some())
            .field("lines", &self.lines)
            .field("level", &self.level)
            .finish()
    }
}

/// True when `path` starts with a container magic.
pub fn is_container(path: impl AsRef<Path>) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| std::io::Read::read_exact(&mut f, &mut magic))
        .map(|_| ContainerKind::from_magic(&magic).is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BandInfo, CellSizeUnits, ColorSpace, Profile};

    fn info(width: usize, height: usize, bands: usize) -> FileInfo {
        FileInfo {
            size_x: width,
            size_y: height,
            compression_rate: 4,
            cell_size_units: CellSizeUnits::Meters,
            color_space: ColorSpace::for_band_count(bands),
            cell_type: CellType::UInt8,
            bands: (1..=bands)
                .map(|n| BandInfo {
                    bits: 8,
                    signed: false,
                    description: format!("Band{}", n),
                })
                .collect(),
            origin_x: 0.0,
            origin_y: 0.0,
            cell_increment_x: 1.0,
            cell_increment_y: 1.0,
            rotation_degrees: 0.0,
            projection: "RAW".to_string(),
            datum: "RAW".to_string(),
        }
    }

    #[test]
    fn test_write_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.jp2");
        let dest = path.to_str().unwrap().to_string();

        let mut codec = ContainerCodec::new(ContainerKind::Jpeg2000);
        codec.set_file_info(&info(4, 2, 2)).unwrap();
        codec
            .set_parameter(CodecParameter::Profile(Profile::Baseline2))
            .unwrap();
        codec.open(OutputTarget::Path(path.clone())).unwrap();
        codec
            .write_line(CellType::UInt8, &[&[1, 2, 3, 4], &[5, 6, 7, 8]])
            .unwrap();
        codec
            .write_line(CellType::UInt8, &[&[9, 9, 9, 9], &[0, 0, 0, 0]])
            .unwrap();
        codec.close().unwrap();
        codec.close().unwrap();

        assert!(is_container(&path));
        let ds = codec.reopen(&dest).unwrap();
        assert_eq!(ds.kind(), ContainerKind::Jpeg2000);
        assert_eq!(ds.lines_written(), 2);
        assert_eq!(ds.read_line(0).unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(ds.header().parameters, vec![CodecParameter::Profile(Profile::Baseline2)]);
    }

    #[test]
    fn test_rejects_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = ContainerCodec::new(ContainerKind::Ecw);
        codec.set_file_info(&info(4, 1, 1)).unwrap();
        codec
            .open(OutputTarget::Path(dir.path().join("x.ecw")))
            .unwrap();

        assert!(matches!(
            codec.write_line(CellType::Int16, &[&[0; 8]]),
            Err(CodecError::InvalidParameter(_))
        ));
        assert!(matches!(
            codec.write_line(CellType::UInt8, &[&[0; 3]]),
            Err(CodecError::InvalidParameter(_))
        ));
        codec.write_line(CellType::UInt8, &[&[0; 4]]).unwrap();
        assert!(matches!(
            codec.write_line(CellType::UInt8, &[&[0; 4]]),
            Err(CodecError::Encode(_))
        ));
    }

    #[test]
    fn test_ecw_takes_no_parameters() {
        let mut codec = ContainerCodec::new(ContainerKind::Ecw);
        assert!(codec.set_parameter(CodecParameter::Levels(3)).is_err());
    }

    #[test]
    fn test_open_requires_file_info() {
        let dir = tempfile::tempdir().unwrap();
        let mut codec = ContainerCodec::new(ContainerKind::Ecw);
        assert!(codec
            .open(OutputTarget::Path(dir.path().join("x.ecw")))
            .is_err());
        assert!(!dir.path().join("x.ecw").exists());
    }
}
