//! One-shot copy of a fully readable raster.

use std::sync::Arc;

use crs_resolver::CrsResolver;
use raster_common::{EncodeError, EncodeResult, GeoReference, RasterGeometry, SampleType};
use tracing::{info, warn};

use crate::codec::Codec;
use crate::compressor::{Compressor, InitParams};
use crate::config::EncoderConfig;
use crate::destination::Destination;
use crate::options::{ContainerKind, EncodingOptions};
use crate::progress::Progress;
use crate::source::SourceRaster;

/// Sample types the JPEG2000 family takes natively.
const JPEG2000_TYPES: [SampleType; 7] = [
    SampleType::UInt8,
    SampleType::Int16,
    SampleType::UInt16,
    SampleType::Int32,
    SampleType::UInt32,
    SampleType::Float32,
    SampleType::Float64,
];

/// Copies whole rasters into a container.
#[derive(Debug, Clone)]
pub struct CopyDriver {
    config: EncoderConfig,
    resolver: Arc<CrsResolver>,
}

impl CopyDriver {
    /// Validate `config` and build its resolver.
    pub fn new(config: EncoderConfig) -> EncodeResult<Self> {
        config.validate().map_err(EncodeError::configuration)?;
        let resolver = Arc::new(config.resolver()?);
        Ok(Self { config, resolver })
    }

    pub fn with_resolver(config: EncoderConfig, resolver: Arc<CrsResolver>) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn resolver(&self) -> Arc<CrsResolver> {
        Arc::clone(&self.resolver)
    }

    /// Check the destination name and source geometry against `kind`.
    pub fn validate(
        &self,
        kind: ContainerKind,
        destination: &Destination,
        geometry: &RasterGeometry,
    ) -> EncodeResult<()> {
        if geometry.band_count == 0 {
            return Err(EncodeError::configuration("at least one band is required"));
        }

        let is_ecw_name = destination.extension().as_deref() == Some("ecw");
        let sample_type = geometry.sample_type;

        let type_ok = match kind {
            ContainerKind::Ecw => {
                if !is_ecw_name {
                    return Err(EncodeError::configuration(
                        "ECW files must be created with a .ecw extension",
                    ));
                }
                let min = self.config.min_ecw_size;
                if geometry.width < min || geometry.height < min {
                    return Err(EncodeError::configuration(format!(
                        "ECW requires an image of at least {}x{}, the source is {}x{}",
                        min, min, geometry.width, geometry.height
                    )));
                }
                sample_type == SampleType::UInt8
            }
            ContainerKind::Jpeg2000 => {
                if is_ecw_name {
                    return Err(EncodeError::configuration(
                        "JPEG2000 files cannot be created with a .ecw extension",
                    ));
                }
                JPEG2000_TYPES.contains(&sample_type)
            }
        };

        if !type_ok {
            if self.config.strict {
                return Err(EncodeError::unsupported_type(format!(
                    "{} does not support data type {}",
                    kind, sample_type
                )));
            }
            warn!(%kind, %sample_type, "Data type not supported natively, it will be coerced");
        }

        Ok(())
    }

    /// Encode all of `source` into `destination` and reopen the result.
    pub fn create_copy<C: Codec>(
        &self,
        codec: C,
        destination: &str,
        source: &dyn SourceRaster,
        kind: ContainerKind,
        options: &EncodingOptions,
        progress: Progress<'_>,
    ) -> EncodeResult<C::Dataset> {
        let dest = Destination::parse(destination)?;
        let geometry = source.geometry();
        self.validate(kind, &dest, &geometry)?;
        options.validate()?;

        let mut compressor = Compressor::new(codec, self.resolver()).with_progress(progress);
        if !compressor.report(0.0, None) {
            return Err(EncodeError::Cancelled);
        }

        let params = InitParams {
            geometry,
            options,
            projection_wkt: source.projection_wkt(),
            geo_reference: source
                .geo_reference()
                .unwrap_or_else(GeoReference::identity),
            kind,
            destination: &dest,
        };
        compressor.initialize(&params)?;

        let written = compressor.write_from_source(source);
        let closed = compressor.close_down();
        written?;
        closed?;

        compressor.report(1.001, None);
        info!(destination, lines = compressor.lines_written(), "Copy complete");

        let dataset = compressor.codec().reopen(destination)?;
        Ok(dataset)
    }
}
