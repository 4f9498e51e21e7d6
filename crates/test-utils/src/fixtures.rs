//! Canonical coordinate-system fixtures.

/// WGS 84 geographic, with EPSG authority.
pub const WKT_WGS84: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

/// WGS 84 geographic without any authority code.
pub const WKT_WGS84_NO_AUTHORITY: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;

/// WGS 84 / UTM zone 33N (EPSG:32633).
pub const WKT_UTM33N: &str = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",15],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1],AUTHORITY["EPSG","32633"]]"#;

/// WGS 84 / UTM zone 56S (EPSG:32756).
pub const WKT_UTM56S: &str = r#"PROJCS["WGS 84 / UTM zone 56S",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",153],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",10000000],UNIT["metre",1],AUTHORITY["EPSG","32756"]]"#;

/// NAD27 geographic with no authority code.
pub const WKT_NAD27: &str = r#"GEOGCS["NAD27",DATUM["North_American_Datum_1927",SPHEROID["Clarke 1866",6378206.4,294.9786982138982]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]"#;

/// Pulkovo 1942 geographic, recognised only by its code.
pub const WKT_PULKOVO: &str = r#"GEOGCS["Pulkovo 1942",DATUM["Pulkovo_1942",SPHEROID["Krassowsky 1940",6378245,298.3]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4284"]]"#;

/// A projected system on GDA94 whose name is in the named table.
pub const WKT_MGA55_NAMED: &str = r#"PROJCS["MGA55",GEOGCS["GDA94",DATUM["Geocentric_Datum_of_Australia_1994",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Lambert_Conformal_Conic_2SP"],UNIT["metre",1]]"#;

/// A Lambert conformal conic system nothing can name.
pub const WKT_UNNAMED_LCC: &str = r#"PROJCS["Custom LCC",GEOGCS["Custom",DATUM["Custom_Datum",SPHEROID["Sphere",6371000,0]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Lambert_Conformal_Conic_2SP"],PARAMETER["standard_parallel_1",33],PARAMETER["standard_parallel_2",45],UNIT["metre",1]]"#;

/// A local engineering system.
pub const WKT_LOCAL: &str = r#"LOCAL_CS["Site grid",UNIT["metre",1]]"#;

/// North-up geotransform with 30 m pixels.
pub const GEO_TRANSFORM_30M: [f64; 6] = [500_000.0, 30.0, 0.0, 4_600_000.0, 0.0, -30.0];

/// The same transform with a rotation term.
pub const GEO_TRANSFORM_ROTATED: [f64; 6] = [500_000.0, 30.0, 0.5, 4_600_000.0, 0.0, -30.0];
