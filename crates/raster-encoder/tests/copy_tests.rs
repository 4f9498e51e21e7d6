//! Copy driver tests: validation, progress and end-to-end reopen.

mod common;

use std::cell::RefCell;
use std::sync::Arc;

use common::{recording_progress, resolver, tagged_raster, RecordingCodec};
use crs_resolver::CrsResolver;
use raster_common::{EncodeError, GeoReference, RasterGeometry, SampleType};
use raster_encoder::{
    ContainerCodec, ContainerKind, CopyDriver, EncodedDataset, EncoderConfig, EncodingOptions,
    MemRaster, PixelSource, Progress, SourceRaster,
};
use test_utils::{
    assert_approx_eq, create_host_file, destination_in, fixtures, gradient_bands_u8,
    index_band_f32, temp_test_dir,
};

fn driver(strict: bool) -> CopyDriver {
    let config = EncoderConfig {
        strict,
        ..Default::default()
    };
    CopyDriver::with_resolver(config, resolver())
}

fn recording_copy(
    driver: &CopyDriver,
    destination: &str,
    source: &MemRaster,
    kind: ContainerKind,
) -> Result<common::Recording, EncodeError> {
    let (codec, _log) = RecordingCodec::new();
    driver.create_copy(
        codec,
        destination,
        source,
        kind,
        &EncodingOptions::default(),
        Progress::none(),
    )
}

// ============================================================================
// Destination and geometry validation
// ============================================================================

#[test]
fn test_ecw_requires_ecw_extension() {
    let source = tagged_raster(128, 128, 1);
    let err = recording_copy(&driver(false), "out.jp2", &source, ContainerKind::Ecw).unwrap_err();
    assert!(matches!(err, EncodeError::Configuration(_)));
    assert!(recording_copy(&driver(false), "OUT.ECW", &source, ContainerKind::Ecw).is_ok());
}

#[test]
fn test_jpeg2000_rejects_ecw_extension() {
    let source = tagged_raster(8, 8, 1);
    let err =
        recording_copy(&driver(false), "out.ecw", &source, ContainerKind::Jpeg2000).unwrap_err();
    assert!(matches!(err, EncodeError::Configuration(_)));
    assert!(recording_copy(&driver(false), "out.j2k", &source, ContainerKind::Jpeg2000).is_ok());
}

#[test]
fn test_ecw_minimum_size() {
    let d = driver(false);
    for (w, h) in [(127, 128), (128, 127), (16, 16)] {
        let source = tagged_raster(w, h, 1);
        let err = recording_copy(&d, "small.ecw", &source, ContainerKind::Ecw).unwrap_err();
        assert!(err.is_validation());
    }

    let relaxed = CopyDriver::with_resolver(
        EncoderConfig {
            min_ecw_size: 16,
            ..Default::default()
        },
        resolver(),
    );
    let source = tagged_raster(16, 16, 1);
    assert!(recording_copy(&relaxed, "small.ecw", &source, ContainerKind::Ecw).is_ok());
}

#[test]
fn test_type_whitelist_only_when_strict() {
    let source = MemRaster::new(RasterGeometry::new(128, 128, 1, SampleType::UInt16));

    let err = recording_copy(&driver(true), "x.ecw", &source, ContainerKind::Ecw).unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedType(_)));
    assert!(recording_copy(&driver(false), "x.ecw", &source, ContainerKind::Ecw).is_ok());
    assert!(recording_copy(&driver(true), "x.jp2", &source, ContainerKind::Jpeg2000).is_ok());

    let complex = MemRaster::new(RasterGeometry::new(8, 8, 1, SampleType::CFloat32));
    let err =
        recording_copy(&driver(true), "x.jp2", &complex, ContainerKind::Jpeg2000).unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedType(_)));
    let rec = recording_copy(&driver(false), "x.jp2", &complex, ContainerKind::Jpeg2000).unwrap();
    assert_eq!(rec.lines[0].len(), 8 * 4);
}

#[test]
fn test_validation_touches_no_codec() {
    let (codec, log) = RecordingCodec::new();
    let source = tagged_raster(8, 8, 1);
    let result = driver(false).create_copy(
        codec,
        "out.ecw",
        &source,
        ContainerKind::Jpeg2000,
        &EncodingOptions::default(),
        Progress::none(),
    );
    assert!(result.is_err());
    let log = log.borrow();
    assert!(log.file_info.is_none());
    assert!(!log.opened);
}

// ============================================================================
// Progress and cancellation
// ============================================================================

#[test]
fn test_progress_bookends() {
    let seen = RefCell::new(Vec::new());
    let (codec, _log) = RecordingCodec::new();
    let source = tagged_raster(8, 4, 2);
    driver(false)
        .create_copy(
            codec,
            "out.jp2",
            &source,
            ContainerKind::Jpeg2000,
            &EncodingOptions::default(),
            recording_progress(&seen, None),
        )
        .unwrap();

    assert_eq!(*seen.borrow(), vec![0.0, 0.25, 0.5, 0.75, 1.0, 1.001]);
}

#[test]
fn test_cancel_at_start_creates_nothing() {
    let dir = temp_test_dir();
    let dest = destination_in(dir.path(), "cancelled.jp2");
    let seen = RefCell::new(Vec::new());
    let source = tagged_raster(8, 4, 1);

    let err = driver(false)
        .create_copy(
            ContainerCodec::new(ContainerKind::Jpeg2000),
            &dest,
            &source,
            ContainerKind::Jpeg2000,
            &EncodingOptions::default(),
            recording_progress(&seen, Some(1)),
        )
        .unwrap_err();
    assert!(matches!(err, EncodeError::Cancelled));
    assert!(!std::path::Path::new(&dest).exists());
}

#[test]
fn test_cancel_mid_copy_still_closes() {
    let seen = RefCell::new(Vec::new());
    let (codec, log) = RecordingCodec::new();
    let source = tagged_raster(8, 10, 1);
    let err = driver(false)
        .create_copy(
            codec,
            "out.jp2",
            &source,
            ContainerKind::Jpeg2000,
            &EncodingOptions::default(),
            recording_progress(&seen, Some(4)),
        )
        .unwrap_err();
    assert!(matches!(err, EncodeError::Cancelled));

    let log = log.borrow();
    assert_eq!(log.line_count(), 3);
    assert_eq!(log.close_calls, 1);
    assert!(!seen.borrow().contains(&1.001));
}

// ============================================================================
// Metadata carried from the source
// ============================================================================

#[test]
fn test_source_crs_and_georeference_used() {
    let source = tagged_raster(8, 8, 1)
        .with_projection(fixtures::WKT_UTM56S)
        .with_geo_reference(GeoReference::from_geo_transform(fixtures::GEO_TRANSFORM_ROTATED));
    let rec = recording_copy(&driver(false), "out.jp2", &source, ContainerKind::Jpeg2000).unwrap();
    let info = rec.file_info.unwrap();
    assert_eq!(info.projection, "SUTM56");
    assert_eq!(info.datum, "WGS84");
    assert_eq!(info.origin_x, 500_000.0);
    assert_eq!(info.rotation_degrees, 0.0);
}

#[test]
fn test_missing_georeference_is_identity() {
    let source = tagged_raster(8, 8, 1);
    let rec = recording_copy(&driver(false), "out.jp2", &source, ContainerKind::Jpeg2000).unwrap();
    let info = rec.file_info.unwrap();
    assert_eq!(
        (info.origin_x, info.origin_y, info.cell_increment_x, info.cell_increment_y),
        (0.0, 0.0, 1.0, 1.0)
    );
}

#[test]
fn test_driver_from_config_loads_table() {
    let dir = temp_test_dir();
    let table = dir.path().join("coordsys.txt");
    std::fs::write(&table, "SITEGRID=PROJCS[\"SITEGRID\",GEOGCS[\"WGS84\"]]\n").unwrap();

    let d = CopyDriver::new(EncoderConfig {
        cs_table_path: Some(table),
        ..Default::default()
    })
    .unwrap();
    assert!(d.resolver().table().is_projection("SITEGRID"));

    let bad = CopyDriver::new(EncoderConfig {
        min_ecw_size: 0,
        ..Default::default()
    });
    assert!(matches!(bad, Err(EncodeError::Configuration(_))));
}

// ============================================================================
// End to end through the reference container
// ============================================================================

#[test]
fn test_end_to_end_256_rgb() {
    let dir = temp_test_dir();
    let dest = destination_in(dir.path(), "rgb.ecw");
    let source = MemRaster::from_u8_bands(256, 256, gradient_bands_u8(256, 256, 3))
        .unwrap()
        .with_geo_reference(GeoReference::identity());

    let driver = CopyDriver::with_resolver(EncoderConfig::default(), Arc::new(CrsResolver::default()));
    let ds: EncodedDataset = driver
        .create_copy(
            ContainerCodec::new(ContainerKind::Ecw),
            &dest,
            &source,
            ContainerKind::Ecw,
            &EncodingOptions::default(),
            Progress::none(),
        )
        .unwrap();

    assert_eq!(ds.geometry(), source.geometry());
    assert_eq!(ds.band_count(), 3);
    assert!(ds.is_complete());
    assert_eq!(ds.projection(), "RAW");
    assert_eq!(ds.datum(), "RAW");

    let mut row = vec![0u8; 256];
    ds.read_row(2, 100, SampleType::UInt8, &mut row).unwrap();
    let expected: Vec<u8> = (0..256).map(|c| ((2 * 64 + 100 + c) % 256) as u8).collect();
    assert_eq!(row, expected);

    let mut short = vec![0u8; 255];
    assert!(matches!(
        ds.read_row(0, 0, SampleType::UInt8, &mut short),
        Err(EncodeError::Io(_))
    ));
    let mut widened = vec![0u8; 256 * 2];
    assert!(matches!(
        ds.read_row(0, 0, SampleType::UInt16, &mut widened[..511]),
        Err(EncodeError::Io(_))
    ));
    ds.read_row(0, 0, SampleType::UInt16, &mut widened).unwrap();
}

#[test]
fn test_end_to_end_float_jpeg2000() {
    let dir = temp_test_dir();
    let dest = destination_in(dir.path(), "elevation.jp2");
    let source = MemRaster::from_f32_bands(40, 20, &[index_band_f32(40, 20)])
        .unwrap()
        .with_projection(fixtures::WKT_UTM33N)
        .with_geo_reference(GeoReference::from_geo_transform(fixtures::GEO_TRANSFORM_30M));

    let ds = driver(true)
        .create_copy(
            ContainerCodec::new(ContainerKind::Jpeg2000),
            &dest,
            &source,
            ContainerKind::Jpeg2000,
            &EncodingOptions::default(),
            Progress::none(),
        )
        .unwrap();

    assert_eq!(ds.projection(), "NUTM33");
    assert_eq!(ds.datum(), "WGS84");
    let geo = ds.geo_reference().unwrap();
    assert_approx_eq!(geo.origin_x, 500_000.0, 1e-9);
    assert_approx_eq!(geo.pixel_size_y, -30.0, 1e-9);

    // Widen to f64 on the way out.
    let mut row = vec![0u8; 40 * 8];
    ds.read_row(0, 7, SampleType::Float64, &mut row).unwrap();
    for (col, chunk) in row.chunks_exact(8).enumerate() {
        let value = f64::from_ne_bytes(chunk.try_into().unwrap());
        assert_approx_eq!(value, (col * 1000 + 7) as f64, 1e-6);
    }
}

#[test]
fn test_end_to_end_into_subfile() {
    let dir = temp_test_dir();
    let host = create_host_file(dir.path(), "host.ntf", 64 * 1024);
    let name = format!("J2K_SUBFILE:1024,60000,{}", host.display());
    let source = tagged_raster(32, 16, 2).with_projection(fixtures::WKT_WGS84);

    let options = EncodingOptions::from_strings(&["PROFILE=NPJE", "LAYERS=3"]).unwrap();
    let ds = driver(false)
        .create_copy(
            ContainerCodec::new(ContainerKind::Jpeg2000),
            &name,
            &source,
            ContainerKind::Jpeg2000,
            &options,
            Progress::none(),
        )
        .unwrap();

    assert_eq!(ds.lines_written(), 16);
    assert_eq!(ds.projection(), "GEODETIC");
    assert_eq!(ds.header().parameters.len(), 2);
    assert_eq!(ds.read_line(5).unwrap(), common::tagged_bil_line(32, 2, 5));

    let bytes = std::fs::read(&host).unwrap();
    assert_eq!(bytes.len(), 64 * 1024);
    assert!(bytes[..1024].iter().all(|&b| b == 0));
    assert_eq!(&bytes[1024..1028], b"JP2R");
}

#[test]
fn test_subfile_window_too_small_fails() {
    let dir = temp_test_dir();
    let host = create_host_file(dir.path(), "host.bin", 4096);
    let name = format!("SUBFILE:0,64,{}", host.display());
    let source = tagged_raster(64, 64, 1);

    let err = driver(false)
        .create_copy(
            ContainerCodec::new(ContainerKind::Jpeg2000),
            &name,
            &source,
            ContainerKind::Jpeg2000,
            &EncodingOptions::default(),
            Progress::none(),
        )
        .unwrap_err();
    assert!(matches!(err, EncodeError::Io(_)));
}
