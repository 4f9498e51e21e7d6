//! Coordinate reference system resolution for the raster encoder.
//!
//! The container only understands a small closed vocabulary of projection
//! and datum names (`GEODETIC`, `NUTM33`, `WGS84`, ...). This crate turns a
//! WKT description into that vocabulary using, in order:
//!
//! 1. an authority-code registry (EPSG number -> projection/datum),
//! 2. a named coordinate-system table,
//! 3. substring heuristics on the datum names,
//! 4. UTM zone detection from projection parameters.
//!
//! The heuristics are deliberately approximate. They match the handful of
//! named systems the container supports rather than testing geodetic
//! equivalence.

pub mod cs_table;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod wkt;

pub use cs_table::CsTable;
pub use error::WktError;
pub use registry::{CrsRegistry, EmptyRegistry, StaticRegistry};
pub use resolver::{CrsResolver, Resolution};
pub use wkt::{SpatialReference, WktNode, WktValue};
