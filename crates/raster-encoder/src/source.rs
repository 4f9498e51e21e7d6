//! Pixel sources read by the copy driver.

use raster_common::{
    convert_row, EncodeError, EncodeResult, GeoReference, RasterGeometry, SampleType,
};

/// Row-at-a-time pixel access.
pub trait PixelSource {
    /// Read row `line` of `band` into `buf`, converted to `sample_type`.
    ///
    /// `buf` holds exactly one row: width samples of `sample_type`.
    fn read_row(
        &self,
        band: usize,
        line: usize,
        sample_type: SampleType,
        buf: &mut [u8],
    ) -> EncodeResult<()>;
}

/// A fully readable raster with its georeferencing.
pub trait SourceRaster: PixelSource {
    fn geometry(&self) -> RasterGeometry;

    /// Coordinate system as WKT, if any.
    fn projection_wkt(&self) -> Option<&str>;

    /// `None` when the raster carries no georeferencing.
    fn geo_reference(&self) -> Option<GeoReference>;
}

/// An in-memory raster, band sequential, native-endian samples.
#[derive(Debug, Clone)]
pub struct MemRaster {
    geometry: RasterGeometry,
    bands: Vec<Vec<u8>>,
    projection: Option<String>,
    geo_reference: Option<GeoReference>,
}

impl MemRaster {
    /// A zero-filled raster.
    pub fn new(geometry: RasterGeometry) -> Self {
        let band_bytes = geometry.row_bytes() * geometry.height;
        Self {
            geometry,
            bands: vec![vec![0u8; band_bytes]; geometry.band_count],
            projection: None,
            geo_reference: None,
        }
    }

    /// Wrap raw band buffers. Each must hold `width * height` samples.
    pub fn from_bands(
        width: usize,
        height: usize,
        sample_type: SampleType,
        bands: Vec<Vec<u8>>,
    ) -> EncodeResult<Self> {
        let geometry = RasterGeometry::new(width, height, bands.len(), sample_type);
        let expected = geometry.row_bytes() * height;
        for (i, band) in bands.iter().enumerate() {
            if band.len() != expected {
                return Err(EncodeError::configuration(format!(
                    "band {} holds {} bytes, expected {}",
                    i + 1,
                    band.len(),
                    expected
                )));
            }
        }
        Ok(Self {
            geometry,
            bands,
            projection: None,
            geo_reference: None,
        })
    }

    pub fn from_u8_bands(width: usize, height: usize, bands: Vec<Vec<u8>>) -> EncodeResult<Self> {
        Self::from_bands(width, height, SampleType::UInt8, bands)
    }

    pub fn from_f32_bands(
        width: usize,
        height: usize,
        bands: &[Vec<f32>],
    ) -> EncodeResult<Self> {
        let raw = bands
            .iter()
            .map(|b| bytemuck::cast_slice::<f32, u8>(b).to_vec())
            .collect();
        Self::from_bands(width, height, SampleType::Float32, raw)
    }

    pub fn with_projection(mut self, wkt: impl Into<String>) -> Self {
        self.projection = Some(wkt.into());
        self
    }

    pub fn with_geo_reference(mut self, geo: GeoReference) -> Self {
        self.geo_reference = Some(geo);
        self
    }

    /// Raw bytes of one band.
    pub fn band(&self, band: usize) -> Option<&[u8]> {
        self.bands.get(band).map(Vec::as_slice)
    }

    pub fn band_mut(&mut self, band: usize) -> Option<&mut [u8]> {
        self.bands.get_mut(band).map(Vec::as_mut_slice)
    }
}

impl PixelSource for MemRaster {
    fn read_row(
        &self,
        band: usize,
        line: usize,
        sample_type: SampleType,
        buf: &mut [u8],
    ) -> EncodeResult<()> {
        let g = &self.geometry;
        if band >= g.band_count || line >= g.height {
            return Err(EncodeError::io(format!(
                "read of band {} line {} outside {}x{}x{} raster",
                band + 1,
                line,
                g.width,
                g.height,
                g.band_count
            )));
        }
        let needed = g.width * sample_type.size_bytes();
        if buf.len() < needed {
            return Err(EncodeError::io(format!(
                "row buffer of {} bytes is smaller than {}",
                buf.len(),
                needed
            )));
        }

        let row_bytes = g.row_bytes();
        let start = line * row_bytes;
        let src = &self.bands[band][start..start + row_bytes];
        convert_row(src, g.sample_type, buf, sample_type, g.width);
        Ok(())
    }
}

impl SourceRaster for MemRaster {
    fn geometry(&self) -> RasterGeometry {
        self.geometry
    }

    fn projection_wkt(&self) -> Option<&str> {
        self.projection.as_deref()
    }

    fn geo_reference(&self) -> Option<GeoReference> {
        self.geo_reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_row_same_type() {
        let raster = MemRaster::from_u8_bands(3, 2, vec![vec![1, 2, 3, 4, 5, 6]]).unwrap();
        let mut buf = vec![0u8; 3];
        raster.read_row(0, 1, SampleType::UInt8, &mut buf).unwrap();
        assert_eq!(buf, vec![4, 5, 6]);
    }

    #[test]
    fn test_read_row_converts() {
        let raster = MemRaster::from_f32_bands(2, 1, &[vec![1.5, 300.0]]).unwrap();
        let mut buf = vec![0u8; 2];
        raster.read_row(0, 0, SampleType::UInt8, &mut buf).unwrap();
        assert_eq!(buf, vec![1, 255]);
    }

    #[test]
    fn test_read_out_of_range() {
        let raster = MemRaster::new(RasterGeometry::new(4, 4, 1, SampleType::UInt8));
        let mut buf = vec![0u8; 4];
        assert!(raster.read_row(1, 0, SampleType::UInt8, &mut buf).is_err());
        assert!(raster.read_row(0, 4, SampleType::UInt8, &mut buf).is_err());
    }

    #[test]
    fn test_band_size_checked() {
        assert!(MemRaster::from_u8_bands(4, 4, vec![vec![0; 15]]).is_err());
    }
}
