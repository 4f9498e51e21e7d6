//! Common test utilities for raster-encoder tests
//!
//! Provides:
//! - A recording fake codec with injectable failures
//! - Tagged in-memory sources whose rows identify their band and line
//! - Progress recorders

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use raster_common::{CellType, EncodeError, EncodeResult, RasterGeometry, SampleType};
use raster_encoder::{
    Codec, CodecError, CodecParameter, FileInfo, MemRaster, OutputTarget, PixelSource, Progress,
};
use crs_resolver::CrsResolver;
use test_utils::tagged_row;

/// Everything the fake codec was told.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    pub file_info: Option<FileInfo>,
    pub parameters: Vec<CodecParameter>,
    pub opened: bool,
    pub opened_window: bool,
    pub cell_types: Vec<CellType>,
    /// One BIL buffer per appended line, in append order.
    pub lines: Vec<Vec<u8>>,
    pub close_calls: usize,
}

impl Recording {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Failures the fake codec should report.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    pub set_file_info: bool,
    pub open: bool,
    /// Fail the append of this (0-based) line with an encode error.
    pub write_at_line: Option<usize>,
}

/// A codec that records calls instead of encoding.
pub struct RecordingCodec {
    pub log: Rc<RefCell<Recording>>,
    failures: Failures,
}

impl RecordingCodec {
    pub fn new() -> (Self, Rc<RefCell<Recording>>) {
        Self::failing(Failures::default())
    }

    pub fn failing(failures: Failures) -> (Self, Rc<RefCell<Recording>>) {
        let log = Rc::new(RefCell::new(Recording::default()));
        (
            Self {
                log: Rc::clone(&log),
                failures,
            },
            log,
        )
    }
}

impl Codec for RecordingCodec {
    type Dataset = Recording;

    fn set_file_info(&mut self, info: &FileInfo) -> Result<(), CodecError> {
        if self.failures.set_file_info {
            return Err(CodecError::InvalidParameter("file info rejected".to_string()));
        }
        self.log.borrow_mut().file_info = Some(info.clone());
        Ok(())
    }

    fn set_parameter(&mut self, parameter: CodecParameter) -> Result<(), CodecError> {
        self.log.borrow_mut().parameters.push(parameter);
        Ok(())
    }

    fn open(&mut self, target: OutputTarget) -> Result<(), CodecError> {
        if self.failures.open {
            return Err(CodecError::Io("destination refused".to_string()));
        }
        let mut log = self.log.borrow_mut();
        log.opened = true;
        log.opened_window = matches!(target, OutputTarget::Window(_));
        Ok(())
    }

    fn write_line(&mut self, cell_type: CellType, bands: &[&[u8]]) -> Result<(), CodecError> {
        let mut log = self.log.borrow_mut();
        if self.failures.write_at_line == Some(log.lines.len()) {
            return Err(CodecError::Encode("bitstream overflow".to_string()));
        }
        log.cell_types.push(cell_type);
        log.lines.push(bands.concat());
        Ok(())
    }

    fn close(&mut self) -> Result<(), CodecError> {
        self.log.borrow_mut().close_calls += 1;
        Ok(())
    }

    fn reopen(&self, _destination: &str) -> EncodeResult<Recording> {
        Ok(self.log.borrow().clone())
    }
}

pub fn resolver() -> Arc<CrsResolver> {
    Arc::new(CrsResolver::default())
}

/// An 8-bit raster whose row `(band, line)` is `tagged_row(width, band, line)`.
pub fn tagged_raster(width: usize, height: usize, bands: usize) -> MemRaster {
    let data = (0..bands)
        .map(|b| (0..height).flat_map(|l| tagged_row(width, b, l)).collect())
        .collect();
    MemRaster::from_u8_bands(width, height, data).unwrap()
}

/// The BIL line a tagged raster produces for `line`.
pub fn tagged_bil_line(width: usize, bands: usize, line: usize) -> Vec<u8> {
    (0..bands).flat_map(|b| tagged_row(width, b, line)).collect()
}

/// Wraps a source and fails reads of one line.
pub struct FailingSource<S> {
    pub inner: S,
    pub fail_line: usize,
}

impl<S: PixelSource> PixelSource for FailingSource<S> {
    fn read_row(
        &self,
        band: usize,
        line: usize,
        sample_type: SampleType,
        buf: &mut [u8],
    ) -> EncodeResult<()> {
        if line == self.fail_line {
            return Err(EncodeError::io(format!("disk read failed at line {}", line)));
        }
        self.inner.read_row(band, line, sample_type, buf)
    }
}

impl<S: raster_encoder::SourceRaster> raster_encoder::SourceRaster for FailingSource<S> {
    fn geometry(&self) -> RasterGeometry {
        self.inner.geometry()
    }

    fn projection_wkt(&self) -> Option<&str> {
        self.inner.projection_wkt()
    }

    fn geo_reference(&self) -> Option<raster_common::GeoReference> {
        self.inner.geo_reference()
    }
}

/// A progress callback that records every fraction and cancels once
/// `cancel_after` reports have been made.
pub fn recording_progress<'a>(
    seen: &'a RefCell<Vec<f64>>,
    cancel_after: Option<usize>,
) -> Progress<'a> {
    Progress::new(move |fraction, _| {
        let mut seen = seen.borrow_mut();
        seen.push(fraction);
        match cancel_after {
            Some(n) => seen.len() < n,
            None => true,
        }
    })
}
