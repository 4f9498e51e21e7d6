//! Raw band-sequential input files.

use std::path::Path;

use anyhow::{bail, Context, Result};
use raster_common::{GeoReference, RasterGeometry};
use raster_encoder::MemRaster;

/// Read a headerless band-sequential file of native-endian samples.
pub fn read_raw(path: &Path, geometry: RasterGeometry) -> Result<MemRaster> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let band_bytes = geometry.row_bytes() * geometry.height;
    let expected = band_bytes * geometry.band_count;
    if data.len() != expected {
        bail!(
            "{} holds {} bytes, {}x{}x{} {} needs {}",
            path.display(),
            data.len(),
            geometry.width,
            geometry.height,
            geometry.band_count,
            geometry.sample_type,
            expected
        );
    }

    let bands = if band_bytes == 0 {
        vec![Vec::new(); geometry.band_count]
    } else {
        data.chunks(band_bytes).map(<[u8]>::to_vec).collect()
    };
    Ok(MemRaster::from_bands(
        geometry.width,
        geometry.height,
        geometry.sample_type,
        bands,
    )?)
}

/// Parse `a,b,c,d,e,f` into a georeference.
pub fn parse_geo_transform(text: &str) -> Result<GeoReference> {
    let terms: Vec<f64> = text
        .split(',')
        .map(|t| t.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid geotransform '{}'", text))?;
    let gt: [f64; 6] = terms
        .try_into()
        .map_err(|v: Vec<f64>| anyhow::anyhow!("geotransform needs 6 terms, got {}", v.len()))?;
    Ok(GeoReference::from_geo_transform(gt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::SampleType;
    use raster_encoder::PixelSource;

    #[test]
    fn test_parse_geo_transform() {
        let geo = parse_geo_transform("500000, 30, 0, 4600000, 0, -30").unwrap();
        assert_eq!(geo.origin_x, 500000.0);
        assert_eq!(geo.pixel_size_y, -30.0);
        assert!(parse_geo_transform("1,2,3").is_err());
        assert!(parse_geo_transform("1,2,3,4,5,x").is_err());
    }

    #[test]
    fn test_read_raw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.raw");
        std::fs::write(&path, [1u8, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let geometry = RasterGeometry::new(2, 2, 2, SampleType::UInt8);
        let raster = read_raw(&path, geometry).unwrap();
        let mut row = [0u8; 2];
        raster.read_row(1, 0, SampleType::UInt8, &mut row).unwrap();
        assert_eq!(row, [5, 6]);

        let wrong = RasterGeometry::new(3, 2, 2, SampleType::UInt8);
        assert!(read_raw(&path, wrong).is_err());
    }
}
