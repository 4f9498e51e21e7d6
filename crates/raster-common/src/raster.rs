//! Raster geometry and georeferencing.

use crate::sample::SampleType;
use serde::{Deserialize, Serialize};

/// Width, height, band count and sample type of a raster.
///
/// Fixed for the lifetime of an encoding session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterGeometry {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub sample_type: SampleType,
}

impl RasterGeometry {
    pub fn new(width: usize, height: usize, band_count: usize, sample_type: SampleType) -> Self {
        Self {
            width,
            height,
            band_count,
            sample_type,
        }
    }

    /// Bytes in one band's row.
    pub fn row_bytes(&self) -> usize {
        self.width * self.sample_type.size_bytes()
    }

    /// Bytes in one full BIL scanline (all bands).
    pub fn scanline_bytes(&self) -> usize {
        self.band_count * self.row_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Affine georeferencing of a north-up raster plus the two rotation terms.
///
/// Mirrors the usual six-term geotransform:
/// `[origin_x, pixel_size_x, rotation[0], origin_y, rotation[1], pixel_size_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoReference {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
    pub rotation: [f64; 2],
}

impl GeoReference {
    pub fn new(origin_x: f64, origin_y: f64, pixel_size_x: f64, pixel_size_y: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_size_x,
            pixel_size_y,
            rotation: [0.0, 0.0],
        }
    }

    /// The identity transform `[0, 1, 0, 0, 0, 1]`.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn from_geo_transform(gt: [f64; 6]) -> Self {
        Self {
            origin_x: gt[0],
            pixel_size_x: gt[1],
            rotation: [gt[2], gt[4]],
            origin_y: gt[3],
            pixel_size_y: gt[5],
        }
    }

    pub fn to_geo_transform(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_size_x,
            self.rotation[0],
            self.origin_y,
            self.rotation[1],
            self.pixel_size_y,
        ]
    }

    pub fn has_rotation(&self) -> bool {
        self.rotation[0] != 0.0 || self.rotation[1] != 0.0
    }

    /// Same transform with both rotation terms set to zero.
    pub fn without_rotation(&self) -> Self {
        Self {
            rotation: [0.0, 0.0],
            ..*self
        }
    }
}

impl Default for GeoReference {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanline_bytes() {
        let g = RasterGeometry::new(256, 128, 3, SampleType::UInt16);
        assert_eq!(g.row_bytes(), 512);
        assert_eq!(g.scanline_bytes(), 1536);
        assert!(!g.is_empty());
    }

    #[test]
    fn test_geo_transform_layout() {
        let gt = [100.0, 2.0, 0.5, 200.0, 0.25, -2.0];
        let geo = GeoReference::from_geo_transform(gt);
        assert_eq!(geo.origin_x, 100.0);
        assert_eq!(geo.origin_y, 200.0);
        assert_eq!(geo.pixel_size_x, 2.0);
        assert_eq!(geo.pixel_size_y, -2.0);
        assert!(geo.has_rotation());
        assert_eq!(geo.to_geo_transform(), gt);

        let flat = geo.without_rotation();
        assert!(!flat.has_rotation());
        assert_eq!(flat.origin_x, 100.0);
        assert_eq!(flat.pixel_size_y, -2.0);
    }

    #[test]
    fn test_identity() {
        assert_eq!(
            GeoReference::identity().to_geo_transform(),
            [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
        );
    }
}
