//! Read-only view of a finished container.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use flate2::read::ZlibDecoder;
use raster_common::{
    convert_row, EncodeError, EncodeResult, GeoReference, RasterGeometry, SampleType,
};
use tracing::debug;

use crate::codec::container::TRAILER_MAGIC;
use crate::codec::{ContainerHeader, FileInfo, CONTAINER_FORMAT_VERSION};
use crate::destination::Destination;
use crate::options::ContainerKind;
use crate::source::{PixelSource, SourceRaster};

#[derive(Debug, Clone, Copy)]
struct LineRecord {
    offset: usize,
    len: usize,
    crc: u32,
}

/// A reopened destination.
#[derive(Debug)]
pub struct EncodedDataset {
    kind: ContainerKind,
    header: ContainerHeader,
    data: Vec<u8>,
    lines: Vec<LineRecord>,
}

impl EncodedDataset {
    /// Open a destination read-only. Subfile names are honoured.
    pub fn open(destination: &str) -> EncodeResult<Self> {
        let dest = Destination::parse(destination)?;
        let mut file = File::open(dest.file_path()).map_err(|e| {
            EncodeError::io(format!("failed to open {}: {}", dest.file_path().display(), e))
        })?;

        let mut data = Vec::new();
        match &dest {
            Destination::Path(_) => {
                file.read_to_end(&mut data)?;
            }
            Destination::Subfile { offset, length, .. } => {
                file.seek(SeekFrom::Start(*offset))?;
                file.take(*length).read_to_end(&mut data)?;
            }
        }

        let ds = Self::parse(data)?;
        debug!(
            destination,
            kind = %ds.kind,
            lines = ds.lines.len(),
            "Reopened container"
        );
        Ok(ds)
    }

    fn parse(data: Vec<u8>) -> EncodeResult<Self> {
        let mut cursor = Cursor::new(&data);

        let kind = ContainerKind::from_magic(cursor.take(4)?)
            .ok_or_else(|| EncodeError::io("not a raster container"))?;
        let version = cursor.take(1)?[0];
        if version != CONTAINER_FORMAT_VERSION {
            return Err(EncodeError::io(format!(
                "unsupported container version {}",
                version
            )));
        }
        let header_len = cursor.u32()? as usize;
        let header: ContainerHeader = serde_json::from_slice(cursor.take(header_len)?)?;

        let mut lines = Vec::new();
        loop {
            let word = cursor.take(4)?;
            if word == TRAILER_MAGIC {
                break;
            }
            let len = u32::from_le_bytes([word[0], word[1], word[2], word[3]]) as usize;
            let offset = cursor.pos;
            cursor.take(len)?;
            let crc = cursor.u32()?;
            lines.push(LineRecord { offset, len, crc });
        }

        let count = cursor.u32()? as usize;
        if count != lines.len() {
            return Err(EncodeError::io(format!(
                "trailer records {} lines but {} are present",
                count,
                lines.len()
            )));
        }

        Ok(Self {
            kind,
            header,
            data,
            lines,
        })
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn info(&self) -> &FileInfo {
        &self.header.info
    }

    pub fn band_count(&self) -> usize {
        self.header.info.band_count()
    }

    pub fn projection(&self) -> &str {
        &self.header.info.projection
    }

    pub fn datum(&self) -> &str {
        &self.header.info.datum
    }

    pub fn lines_written(&self) -> usize {
        self.lines.len()
    }

    /// Every line of the raster was written.
    pub fn is_complete(&self) -> bool {
        self.lines.len() == self.header.info.size_y
    }

    /// Decode one BIL line (all bands), verifying its checksum.
    pub fn read_line(&self, line: usize) -> EncodeResult<Vec<u8>> {
        let record = self.lines.get(line).ok_or_else(|| {
            EncodeError::io(format!(
                "line {} not present, {} lines written",
                line,
                self.lines.len()
            ))
        })?;

        let compressed = &self.data[record.offset..record.offset + record.len];
        let mut bil = Vec::with_capacity(self.header.info.row_bytes() * self.band_count());
        ZlibDecoder::new(compressed).read_to_end(&mut bil)?;

        if crc32fast::hash(&bil) != record.crc {
            return Err(EncodeError::io(format!("checksum mismatch on line {}", line)));
        }
        Ok(bil)
    }
}

impl PixelSource for EncodedDataset {
    fn read_row(
        &self,
        band: usize,
        line: usize,
        sample_type: SampleType,
        buf: &mut [u8],
    ) -> EncodeResult<()> {
        let info = &self.header.info;
        if band >= info.band_count() {
            return Err(EncodeError::io(format!("band {} not present", band + 1)));
        }
        let needed = info.size_x * sample_type.size_bytes();
        if buf.len() < needed {
            return Err(EncodeError::io(format!(
                "row buffer of {} bytes is smaller than {}",
                buf.len(),
                needed
            )));
        }
        let bil = self.read_line(line)?;
        let row_bytes = info.row_bytes();
        if bil.len() < info.band_count() * row_bytes {
            return Err(EncodeError::io(format!(
                "line {} holds {} bytes, expected {}",
                line,
                bil.len(),
                info.band_count() * row_bytes
            )));
        }
        let segment = &bil[band * row_bytes..(band + 1) * row_bytes];
        convert_row(
            segment,
            info.cell_type.sample_type(),
            buf,
            sample_type,
            info.size_x,
        );
        Ok(())
    }
}

impl SourceRaster for EncodedDataset {
    fn geometry(&self) -> RasterGeometry {
        let info = &self.header.info;
        RasterGeometry::new(
            info.size_x,
            info.size_y,
            info.band_count(),
            info.cell_type.sample_type(),
        )
    }

    fn projection_wkt(&self) -> Option<&str> {
        None
    }

    fn geo_reference(&self) -> Option<GeoReference> {
        let info = &self.header.info;
        Some(GeoReference::new(
            info.origin_x,
            info.origin_y,
            info.cell_increment_x,
            info.cell_increment_y,
        ))
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> EncodeResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(EncodeError::io(format!(
                "container truncated at byte {}",
                self.pos
            ))),
        }
    }

    fn u32(&mut self) -> EncodeResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}
