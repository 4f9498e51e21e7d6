//! Deterministic raster generators.
//!
//! Every generator encodes its coordinates into the value so a test can tell
//! exactly which band and line a buffer came from.

/// One 8-bit band in row-major order. Pixel value is
/// `(band * 64 + row + col) % 256`.
pub fn gradient_band_u8(width: usize, height: usize, band: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(((band * 64 + row + col) % 256) as u8);
        }
    }
    data
}

/// `bands` 8-bit bands, each from `gradient_band_u8`.
pub fn gradient_bands_u8(width: usize, height: usize, bands: usize) -> Vec<Vec<u8>> {
    (0..bands)
        .map(|b| gradient_band_u8(width, height, b))
        .collect()
}

/// A row whose bytes identify `(band, line)`: each byte is
/// `(band * 31 + line * 7 + i) % 251`.
pub fn tagged_row(row_bytes: usize, band: usize, line: usize) -> Vec<u8> {
    (0..row_bytes)
        .map(|i| ((band * 31 + line * 7 + i) % 251) as u8)
        .collect()
}

/// One float band in row-major order where value = `col * 1000 + row`.
pub fn index_band_f32(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}
