//! The compressor adapter: owns one codec session.
//!
//! ```text
//!   Uninitialized --initialize--> Initialized --close_down--> Closed
//!                                      |                         ^
//!                                 write fails --> Aborted --close_down
//! ```
//!
//! There is no way back to an earlier state; the codec is write-once.
//! Lines reach the codec exactly once and in order: either pushed one at a
//! time, or pulled all at once by a single [`Compressor::write_from_source`]
//! on a session nothing has been pushed to.

use std::sync::Arc;

use crs_resolver::CrsResolver;
use raster_common::crs::GEODETIC;
use raster_common::{
    CellType, EncodeError, EncodeResult, GeoReference, ProjectionDatum, RasterGeometry,
    SampleType,
};
use tracing::{debug, info, warn};

use crate::codec::{
    BandInfo, CellSizeUnits, Codec, CodecError, ColorSpace, FileInfo, LineProvider,
};
use crate::destination::Destination;
use crate::options::{ContainerKind, EncodingOptions};
use crate::progress::Progress;
use crate::source::PixelSource;

/// Lifecycle of a codec session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Uninitialized,
    Initialized,
    /// A write failed. The codec is still closed on teardown, but takes no
    /// more lines.
    Aborted,
    Closed,
}

/// Everything [`Compressor::initialize`] needs.
#[derive(Debug, Clone)]
pub struct InitParams<'a> {
    pub geometry: RasterGeometry,
    pub options: &'a EncodingOptions,
    /// Coordinate system as WKT.
    pub projection_wkt: Option<&'a str>,
    pub geo_reference: GeoReference,
    pub kind: ContainerKind,
    pub destination: &'a Destination,
}

/// Drives one codec session, in push or pull mode.
pub struct Compressor<'p, C: Codec> {
    codec: C,
    resolver: Arc<CrsResolver>,
    state: EncoderState,
    info: Option<FileInfo>,
    cell_type: CellType,
    work_type: SampleType,
    lines_written: usize,
    pulled: bool,
    progress: Progress<'p>,
}

impl<'p, C: Codec> Compressor<'p, C> {
    pub fn new(codec: C, resolver: Arc<CrsResolver>) -> Self {
        Self {
            codec,
            resolver,
            state: EncoderState::Uninitialized,
            info: None,
            cell_type: CellType::UInt8,
            work_type: SampleType::UInt8,
            lines_written: 0,
            pulled: false,
            progress: Progress::none(),
        }
    }

    pub fn with_progress(mut self, progress: Progress<'p>) -> Self {
        self.progress = progress;
        self
    }

    pub fn set_progress(&mut self, progress: Progress<'p>) {
        self.progress = progress;
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// File info handed to the codec, once initialized.
    pub fn file_info(&self) -> Option<&FileInfo> {
        self.info.as_ref()
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Cell type written to the codec.
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Sample type lines must be supplied in.
    pub fn work_type(&self) -> SampleType {
        self.work_type
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Configure and open the codec session.
    pub fn initialize(&mut self, params: &InitParams<'_>) -> EncodeResult<()> {
        if self.state != EncoderState::Uninitialized {
            return Err(EncodeError::configuration(
                "compressor is already initialized",
            ));
        }

        let geometry = params.geometry;
        if geometry.band_count == 0 {
            return Err(EncodeError::configuration(
                "at least one band is required",
            ));
        }
        params.options.validate()?;

        let (cell_type, work_type) = CellType::for_sample_type(geometry.sample_type);
        if work_type != geometry.sample_type {
            warn!(
                sample_type = %geometry.sample_type,
                work_type = %work_type,
                "Sample type not supported by the codec, coercing"
            );
        }

        let bands = (1..=geometry.band_count)
            .map(|n| BandInfo {
                bits: cell_type.bits(),
                signed: cell_type.is_signed(),
                description: format!("Band{}", n),
            })
            .collect();

        let geo = effective_geo_reference(params.geo_reference);
        let codes = self.projection_datum(params.options, params.projection_wkt);
        debug!(projection = %codes.projection, datum = %codes.datum, "Writing with");

        let info = FileInfo {
            size_x: geometry.width,
            size_y: geometry.height,
            compression_rate: params.options.compression_ratio(),
            cell_size_units: CellSizeUnits::Meters,
            color_space: ColorSpace::for_band_count(geometry.band_count),
            cell_type,
            bands,
            origin_x: geo.origin_x,
            origin_y: geo.origin_y,
            cell_increment_x: geo.pixel_size_x,
            cell_increment_y: geo.pixel_size_y,
            rotation_degrees: 0.0,
            projection: codes.projection,
            datum: codes.datum,
        };

        if params.kind.accepts_tuning() {
            for parameter in params.options.jpeg2000.codec_parameters() {
                debug!(?parameter, "Setting codec parameter");
                self.codec.set_parameter(parameter)?;
            }
        }

        // A metadata failure does not stop the open.
        if let Err(e) = self.codec.set_file_info(&info) {
            warn!(error = %e, "Codec rejected file info, opening anyway");
        }

        let target = params.destination.clone().into_target()?;
        if let Err(e) = self.codec.open(target) {
            self.state = EncoderState::Closed;
            return Err(EncodeError::io(format!(
                "failed to open {}: {}",
                params.destination.file_path().display(),
                e
            )));
        }

        info!(
            destination = %params.destination.file_path().display(),
            kind = %params.kind,
            width = geometry.width,
            height = geometry.height,
            bands = geometry.band_count,
            cell_type = ?cell_type,
            compression_rate = info.compression_rate,
            "Opened encoding session"
        );

        self.cell_type = cell_type;
        self.work_type = work_type;
        self.info = Some(info);
        self.state = EncoderState::Initialized;
        Ok(())
    }

    fn projection_datum(
        &self,
        options: &EncodingOptions,
        wkt: Option<&str>,
    ) -> ProjectionDatum {
        let mut codes = ProjectionDatum::raw();
        if let Some(proj) = &options.projection {
            codes.set_projection(proj);
        }
        if let Some(datum) = &options.datum {
            codes.set_datum(datum);
            if codes.is_raw_projection() {
                codes.set_projection(GEODETIC);
            }
        }

        if codes.is_raw_projection() && wkt.is_some() {
            let resolution = self.resolver.resolve(wkt);
            if !resolution.resolved {
                debug!(codes = %resolution.codes, "Coordinate system only partially resolved");
            }
            codes = resolution.codes;
        }
        codes
    }

    /// Pull every line from `source` through the codec.
    ///
    /// Only valid once, on a session no line has been pushed to.
    pub fn write_from_source<S: PixelSource + ?Sized>(&mut self, source: &S) -> EncodeResult<()> {
        let (band_count, width, height) = {
            let info = self.require_initialized()?;
            (info.band_count(), info.size_x, info.size_y)
        };
        if self.pulled || self.lines_written != 0 {
            return Err(EncodeError::Sequencing {
                loaded_line: self.lines_written as i64 - 1,
                line: 0,
                band: 0,
            });
        }
        self.pulled = true;

        let mut feed = LineFeed {
            source,
            progress: &mut self.progress,
            lines_written: &mut self.lines_written,
            cell_type: self.cell_type,
            work_type: self.work_type,
            band_count,
            width,
            height,
            failure: None,
        };

        let result = self.codec.write_all(&mut feed);
        let outcome = match (result, feed.failure.take()) {
            (_, Some(err)) => Err(err),
            (Err(e), None) => Err(e.into()),
            (Ok(()), None) => Ok(()),
        };
        if outcome.is_err() {
            self.state = EncoderState::Aborted;
        }
        outcome
    }

    /// Report progress after `lines_done` lines. Returns `false` once the
    /// callback has asked to cancel.
    pub fn report_progress(&mut self, lines_done: usize) -> bool {
        let height = self.info.as_ref().map(|i| i.size_y).unwrap_or(0);
        self.progress.report(line_fraction(lines_done, height), None)
    }

    /// Report an arbitrary fraction, e.g. the 0.0 and 1.001 bookends.
    pub fn report(&mut self, fraction: f64, message: Option<&str>) -> bool {
        self.progress.report(fraction, message)
    }

    pub fn is_cancelled(&self) -> bool {
        self.progress.is_cancelled()
    }

    /// Push one assembled line to the codec.
    pub fn write_scanline(&mut self, cell_type: CellType, bands: &[&[u8]]) -> EncodeResult<()> {
        let info = self.require_initialized()?;
        if self.pulled || self.lines_written >= info.size_y {
            return Err(EncodeError::Sequencing {
                loaded_line: self.lines_written as i64 - 1,
                line: self.lines_written,
                band: 0,
            });
        }
        if bands.len() != info.band_count() {
            return Err(EncodeError::configuration(format!(
                "scanline carries {} bands, session has {}",
                bands.len(),
                info.band_count()
            )));
        }
        if self.is_cancelled() {
            return Err(EncodeError::Cancelled);
        }

        if let Err(e) = self.codec.write_line(cell_type, bands) {
            self.state = EncoderState::Aborted;
            warn!(line = self.lines_written, error = %e, "Scanline write failed, session aborted");
            return Err(match e {
                CodecError::Io(msg) => EncodeError::Io(msg),
                CodecError::Cancelled => EncodeError::Cancelled,
                other => EncodeError::Codec(other.to_string()),
            });
        }

        self.lines_written += 1;
        self.report_progress(self.lines_written);
        Ok(())
    }

    /// Finish the codec session. Safe to call more than once.
    pub fn close_down(&mut self) -> EncodeResult<()> {
        let was = self.state;
        self.state = EncoderState::Closed;
        if !matches!(was, EncoderState::Initialized | EncoderState::Aborted) {
            return Ok(());
        }
        self.codec.close()?;
        info!(lines = self.lines_written, "Closed encoding session");
        Ok(())
    }

    fn require_initialized(&self) -> EncodeResult<&FileInfo> {
        match (self.state, self.info.as_ref()) {
            (EncoderState::Initialized, Some(info)) => Ok(info),
            (EncoderState::Aborted | EncoderState::Closed, _) => {
                Err(EncodeError::SessionAborted)
            }
            _ => Err(EncodeError::configuration("compressor is not initialized")),
        }
    }
}

impl<C: Codec> Drop for Compressor<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.close_down() {
            warn!(error = %e, "Error closing encoding session during teardown");
        }
    }
}

/// Non-zero rotation is dropped with a warning; origin and pixel size stay,
/// rather than falling back to the default `(0, height, 1, -1)` transform.
fn effective_geo_reference(geo: GeoReference) -> GeoReference {
    if geo.has_rotation() {
        warn!(
            rotation_x = geo.rotation[0],
            rotation_y = geo.rotation[1],
            "Rotational coefficients ignored, georeferencing of output will be incorrect"
        );
    }
    geo.without_rotation()
}

fn line_fraction(lines_done: usize, height: usize) -> f64 {
    if height == 0 {
        return 1.0;
    }
    (lines_done as f64 / height as f64).min(1.0)
}

/// Adapts a pixel source to the codec's pull loop.
struct LineFeed<'a, 'p, S: ?Sized> {
    source: &'a S,
    progress: &'a mut Progress<'p>,
    lines_written: &'a mut usize,
    cell_type: CellType,
    work_type: SampleType,
    band_count: usize,
    width: usize,
    height: usize,
    failure: Option<EncodeError>,
}

impl<S: PixelSource + ?Sized> LineProvider for LineFeed<'_, '_, S> {
    fn cell_type(&self) -> CellType {
        self.cell_type
    }

    fn band_count(&self) -> usize {
        self.band_count
    }

    fn row_bytes(&self) -> usize {
        self.width * self.work_type.size_bytes()
    }

    fn line_count(&self) -> usize {
        self.height
    }

    fn supply_line(&mut self, line: usize, bands: &mut [Vec<u8>]) -> Result<(), CodecError> {
        for (band, buf) in bands.iter_mut().enumerate() {
            if let Err(e) = self.source.read_row(band, line, self.work_type, buf) {
                let msg = e.to_string();
                self.failure = Some(e);
                return Err(CodecError::Io(msg));
            }
        }
        Ok(())
    }

    fn report_progress(&mut self, lines_done: usize) {
        *self.lines_written = lines_done;
        self.progress
            .report(line_fraction(lines_done, self.height), None);
    }

    fn is_cancelled(&self) -> bool {
        self.progress.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_fraction() {
        assert_eq!(line_fraction(0, 4), 0.0);
        assert_eq!(line_fraction(2, 4), 0.5);
        assert_eq!(line_fraction(4, 4), 1.0);
        assert_eq!(line_fraction(9, 4), 1.0);
        assert_eq!(line_fraction(0, 0), 1.0);
    }

    #[test]
    fn test_rotation_forced_to_zero() {
        let mut geo = GeoReference::new(500000.0, 4649776.0, 30.0, -30.0);
        geo.rotation = [0.5, -0.25];
        let eff = effective_geo_reference(geo);
        assert_eq!(eff.rotation, [0.0, 0.0]);
        assert_eq!(eff.origin_x, 500000.0);
        assert_eq!(eff.pixel_size_y, -30.0);
    }
}
