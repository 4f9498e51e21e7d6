//! WKT -> (projection, datum) resolution.

use tracing::{debug, warn};

use raster_common::crs::GEODETIC;
use raster_common::ProjectionDatum;

use crate::cs_table::CsTable;
use crate::registry::{CrsRegistry, StaticRegistry};
use crate::wkt::SpatialReference;

/// Datums recognised from a bare authority code when everything else failed.
const DATUM_BY_CODE: &[(u32, &str)] = &[
    (4277, "OSGB36"),
    (4278, "OSGB78"),
    (4201, "ADINDAN"),
    (4202, "AGD66"),
    (4203, "AGD84"),
    (4209, "ARC1950"),
    (4210, "ARC1960"),
    (4275, "NTF"),
    (4284, "PULKOVO"),
];

/// Outcome of a resolution.
///
/// `resolved == false` is best effort: `codes` still holds whatever could be
/// determined (possibly RAW/RAW) and callers proceed with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub codes: ProjectionDatum,
    pub resolved: bool,
}

impl Resolution {
    fn done(codes: ProjectionDatum) -> Self {
        Self {
            codes,
            resolved: true,
        }
    }

    fn partial(codes: ProjectionDatum) -> Self {
        Self {
            codes,
            resolved: false,
        }
    }
}

/// Resolves coordinate systems against a registry and a name table.
pub struct CrsResolver {
    registry: Box<dyn CrsRegistry + Send + Sync>,
    table: CsTable,
}

impl Default for CrsResolver {
    fn default() -> Self {
        Self::new(StaticRegistry::builtin(), CsTable::builtin())
    }
}

impl std::fmt::Debug for CrsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrsResolver")
            .field("table_entries", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl CrsResolver {
    pub fn new(registry: impl CrsRegistry + Send + Sync + 'static, table: CsTable) -> Self {
        Self {
            registry: Box::new(registry),
            table,
        }
    }

    pub fn table(&self) -> &CsTable {
        &self.table
    }

    /// Resolve WKT text. Empty or absent text is RAW/RAW, not resolved;
    /// unparsable text is treated the same way.
    pub fn resolve(&self, wkt: Option<&str>) -> Resolution {
        let text = match wkt {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Resolution::partial(ProjectionDatum::raw()),
        };

        match SpatialReference::from_wkt(text) {
            Ok(srs) => self.resolve_srs(&srs),
            Err(e) => {
                warn!(error = %e, "Unreadable coordinate system, writing RAW");
                Resolution::partial(ProjectionDatum::raw())
            }
        }
    }

    /// Resolve an already parsed system.
    pub fn resolve_srs(&self, srs: &SpatialReference) -> Resolution {
        let mut codes = ProjectionDatum::raw();

        if srs.is_local() {
            return Resolution::done(codes);
        }

        // Authority code of the top-level system wins outright.
        let epsg = srs.epsg_code();
        if let Some(code) = epsg {
            let hit = self.registry.lookup(code);
            debug!(code, hit = ?hit, "Authority code lookup");
            if let Some(found) = hit {
                return Resolution::done(found);
            }
        }

        let geogcs = srs.geogcs_name();
        let wkt_datum = srs.datum_name();

        if let Some(name) = geogcs {
            if self.table.is_datum(name) {
                codes.set_datum(name);
            }
        }

        if codes.is_raw_datum() {
            if let Some(datum) = well_known_datum(epsg, geogcs, wkt_datum) {
                codes.set_datum(datum);
            }
        }

        if srs.is_geographic() {
            codes.set_projection(GEODETIC);
            return Resolution::done(codes);
        }

        if let Some((zone, north)) = srs.utm_zone() {
            let hemisphere = if north { 'N' } else { 'S' };
            codes.set_projection(format!("{}UTM{:02}", hemisphere, zone));
            return Resolution::done(codes);
        }

        if let Some(name) = srs.projcs_name() {
            if self.table.is_projection(name) {
                codes.set_projection(name);
                return Resolution::done(codes);
            }
        }

        Resolution::partial(codes)
    }
}

/// Substring heuristics on the geographic-system and datum names, then a
/// fixed code table. Containment tests are case-sensitive.
fn well_known_datum(
    epsg: Option<u32>,
    geogcs: Option<&str>,
    wkt_datum: Option<&str>,
) -> Option<&'static str> {
    let mentions = |a: &str, b: &str| {
        let has = |s: Option<&str>| s.map(|s| s.contains(a) && s.contains(b)).unwrap_or(false);
        has(geogcs) || has(wkt_datum)
    };

    if epsg == Some(4326) || mentions("WGS", "84") {
        Some("WGS84")
    } else if epsg == Some(4322) || mentions("WGS", "72") {
        Some("WGS72DOD")
    } else if epsg == Some(4267) || mentions("NAD", "27") {
        Some("NAD27")
    } else if epsg == Some(4269) || mentions("NAD", "83") {
        Some("NAD83")
    } else {
        let code = epsg?;
        DATUM_BY_CODE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, datum)| *datum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_datum_priority() {
        assert_eq!(well_known_datum(Some(4326), None, None), Some("WGS84"));
        assert_eq!(well_known_datum(None, Some("WGS 72"), None), Some("WGS72DOD"));
        assert_eq!(well_known_datum(None, None, Some("NAD_1927")), Some("NAD27"));
        assert_eq!(well_known_datum(None, Some("NAD83 / x"), None), Some("NAD83"));
        assert_eq!(well_known_datum(Some(4284), Some("Pulkovo 1942"), None), Some("PULKOVO"));
        assert_eq!(well_known_datum(None, Some("wgs 84"), None), None);
        assert_eq!(well_known_datum(None, None, None), None);
    }
}
