//! Incremental, write-only raster surface.
//!
//! Callers write one row of one band at a time. Rows are collected into a
//! BIL buffer and the whole line is pushed to the codec when the first
//! write of the next line arrives:
//!
//! ```text
//!   write(b, L)   L == loaded + 1  -> flush loaded line, loaded = L
//!                 L == loaded      -> copy into band segment b
//!                 otherwise        -> Sequencing error, session aborted
//! ```
//!
//! The codec session is only opened ("crystallized") on the first flush,
//! so georeferencing and projection may be set until then.

use std::sync::Arc;

use crs_resolver::CrsResolver;
use raster_common::{convert_row, EncodeError, EncodeResult, GeoReference, RasterGeometry};
use tracing::{debug, warn};

use crate::codec::Codec;
use crate::compressor::{Compressor, InitParams};
use crate::destination::Destination;
use crate::options::{ContainerKind, EncodingOptions};
use crate::progress::Progress;

/// Write-only dataset fed band by band, line by line.
pub struct ScanlineWriter<'p, C: Codec> {
    compressor: Compressor<'p, C>,
    geometry: RasterGeometry,
    kind: ContainerKind,
    destination: Destination,
    options: EncodingOptions,
    projection_wkt: Option<String>,
    geo_reference: GeoReference,
    loaded_line: i64,
    buffer: Vec<u8>,
    band_written: Vec<bool>,
    work_buffer: Vec<u8>,
    crystallized: bool,
    aborted: bool,
    finished: bool,
}

impl<'p, C: Codec> ScanlineWriter<'p, C> {
    /// Create the writer. No output is touched until the first line flush.
    pub fn create(
        codec: C,
        resolver: Arc<CrsResolver>,
        destination: &str,
        geometry: RasterGeometry,
        kind: ContainerKind,
        options: EncodingOptions,
    ) -> EncodeResult<Self> {
        if geometry.band_count == 0 {
            return Err(EncodeError::configuration("at least one band is required"));
        }
        if geometry.is_empty() {
            return Err(EncodeError::configuration(format!(
                "raster of {}x{} has no pixels",
                geometry.width, geometry.height
            )));
        }
        options.validate()?;
        let destination = Destination::parse(destination)?;

        Ok(Self {
            compressor: Compressor::new(codec, resolver),
            geometry,
            kind,
            destination,
            options,
            projection_wkt: None,
            geo_reference: GeoReference::identity(),
            loaded_line: -1,
            buffer: vec![0u8; geometry.scanline_bytes()],
            band_written: vec![false; geometry.band_count],
            work_buffer: Vec::new(),
            crystallized: false,
            aborted: false,
            finished: false,
        })
    }

    pub fn with_progress(mut self, progress: Progress<'p>) -> Self {
        self.compressor.set_progress(progress);
        self
    }

    pub fn geometry(&self) -> RasterGeometry {
        self.geometry
    }

    /// Line currently buffered, -1 before the first write.
    pub fn loaded_line(&self) -> i64 {
        self.loaded_line
    }

    pub fn is_crystallized(&self) -> bool {
        self.crystallized
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn compressor(&self) -> &Compressor<'p, C> {
        &self.compressor
    }

    pub fn geo_reference(&self) -> GeoReference {
        self.geo_reference
    }

    pub fn projection_wkt(&self) -> Option<&str> {
        self.projection_wkt.as_deref()
    }

    pub fn set_geo_reference(&mut self, geo: GeoReference) -> EncodeResult<()> {
        self.require_metadata_open("georeferencing")?;
        self.geo_reference = geo;
        Ok(())
    }

    pub fn set_projection(&mut self, wkt: impl Into<String>) -> EncodeResult<()> {
        self.require_metadata_open("projection")?;
        self.projection_wkt = Some(wkt.into());
        Ok(())
    }

    fn require_metadata_open(&self, what: &str) -> EncodeResult<()> {
        if self.crystallized || self.finished {
            return Err(EncodeError::configuration(format!(
                "{} cannot change once image data has been flushed",
                what
            )));
        }
        Ok(())
    }

    /// Write one row of `band` (0-based) at `line`. `data` holds one row in
    /// the raster's sample type.
    pub fn write_block(&mut self, band: usize, line: usize, data: &[u8]) -> EncodeResult<()> {
        if self.aborted || self.finished {
            return Err(EncodeError::SessionAborted);
        }
        if band >= self.geometry.band_count {
            return Err(EncodeError::configuration(format!(
                "band {} out of range, raster has {}",
                band,
                self.geometry.band_count
            )));
        }
        let row_bytes = self.geometry.row_bytes();
        if data.len() != row_bytes {
            return Err(EncodeError::configuration(format!(
                "block holds {} bytes, a row is {}",
                data.len(),
                row_bytes
            )));
        }
        if line >= self.geometry.height {
            if self.crystallized && self.loaded_line >= 0 {
                warn!(
                    loaded_line = self.loaded_line,
                    line,
                    "Write past the last line, buffered line will not be flushed"
                );
            }
            return self.abort(EncodeError::Sequencing {
                loaded_line: self.loaded_line,
                line,
                band,
            });
        }

        let line_idx = line as i64;
        if line_idx == self.loaded_line + 1 {
            if let Err(e) = self.flush_line(false) {
                return self.abort(e);
            }
        }

        if line_idx != self.loaded_line {
            return self.abort(EncodeError::Sequencing {
                loaded_line: self.loaded_line,
                line,
                band,
            });
        }

        let start = band * row_bytes;
        self.buffer[start..start + row_bytes].copy_from_slice(data);
        self.band_written[band] = true;
        Ok(())
    }

    /// The surface is write-only: reads succeed with zeros.
    pub fn read_block(&self, _band: usize, _line: usize, buf: &mut [u8]) -> EncodeResult<()> {
        buf.fill(0);
        Ok(())
    }

    fn abort(&mut self, err: EncodeError) -> EncodeResult<()> {
        warn!(error = %err, "Aborting scanline session");
        self.aborted = true;
        Err(err)
    }

    fn crystallize(&mut self) -> EncodeResult<()> {
        if self.crystallized {
            return Ok(());
        }
        let params = InitParams {
            geometry: self.geometry,
            options: &self.options,
            projection_wkt: self.projection_wkt.as_deref(),
            geo_reference: self.geo_reference,
            kind: self.kind,
            destination: &self.destination,
        };
        self.compressor.initialize(&params)?;
        self.crystallized = true;
        self.loaded_line = -1;
        debug!(
            work_type = %self.compressor.work_type(),
            "Scanline session crystallized"
        );
        Ok(())
    }

    /// Push the buffered line (if any), clear the buffer and advance.
    fn flush_line(&mut self, final_line: bool) -> EncodeResult<()> {
        self.crystallize()?;

        if self.loaded_line >= 0 {
            let line = self.loaded_line as usize;
            if let Some(missing) = self.band_written.iter().position(|w| !w) {
                if !final_line {
                    return Err(EncodeError::IncompleteLine {
                        line,
                        band: missing,
                    });
                }
                warn!(line, band = missing, "Flushing final line with unwritten bands");
            }
            self.push_buffer()?;
        }

        self.buffer.fill(0);
        self.band_written.fill(false);
        self.loaded_line += 1;
        Ok(())
    }

    fn push_buffer(&mut self) -> EncodeResult<()> {
        let width = self.geometry.width;
        let host_type = self.geometry.sample_type;
        let work_type = self.compressor.work_type();
        let cell_type = self.compressor.cell_type();

        let (data, row_bytes): (&[u8], usize) = if work_type == host_type {
            (&self.buffer, self.geometry.row_bytes())
        } else {
            let host_row = self.geometry.row_bytes();
            let work_row = width * work_type.size_bytes();
            self.work_buffer.resize(work_row * self.geometry.band_count, 0);
            for (src, dst) in self
                .buffer
                .chunks(host_row)
                .zip(self.work_buffer.chunks_mut(work_row))
            {
                convert_row(src, host_type, dst, work_type, width);
            }
            (&self.work_buffer, work_row)
        };

        let bands: Vec<&[u8]> = data.chunks(row_bytes).collect();
        self.compressor.write_scanline(cell_type, &bands)
    }

    /// Flush the final line if it is complete, then close the session.
    pub fn finish(mut self) -> EncodeResult<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> EncodeResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let mut result = Ok(());
        if self.crystallized && !self.aborted {
            let last = self.geometry.height as i64 - 1;
            if self.loaded_line == last {
                result = self.flush_line(true);
            } else {
                warn!(
                    loaded_line = self.loaded_line,
                    height = self.geometry.height,
                    "Closing before every line was written"
                );
            }
        }

        let close = self.compressor.close_down();
        result.and(close)
    }
}

impl<C: Codec> Drop for ScanlineWriter<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(error = %e, "Error finishing scanline session during teardown");
        }
    }
}

