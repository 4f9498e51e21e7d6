//! Common types shared across the raster encoding workspace.

pub mod crs;
pub mod error;
pub mod raster;
pub mod sample;

pub use crs::ProjectionDatum;
pub use error::{EncodeError, EncodeResult};
pub use raster::{GeoReference, RasterGeometry};
pub use sample::{convert_row, CellType, SampleType};
