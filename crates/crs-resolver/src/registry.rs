//! Authority-code registries.

use std::collections::HashMap;

use raster_common::crs::GEODETIC;
use raster_common::ProjectionDatum;

/// Maps an EPSG-style numeric code straight to a projection/datum pair.
pub trait CrsRegistry {
    fn lookup(&self, code: u32) -> Option<ProjectionDatum>;
}

/// A registry that never matches; forces the name and heuristic paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRegistry;

impl CrsRegistry for EmptyRegistry {
    fn lookup(&self, _code: u32) -> Option<ProjectionDatum> {
        None
    }
}

/// In-memory registry keyed by code.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: HashMap<u32, ProjectionDatum>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the common geographic systems and the WGS84, NAD83,
    /// NAD27 and GDA94 (MGA) UTM families.
    pub fn builtin() -> Self {
        let mut reg = Self::new();

        for (code, datum) in [
            (4326, "WGS84"),
            (4322, "WGS72DOD"),
            (4267, "NAD27"),
            (4269, "NAD83"),
            (4283, "GDA94"),
            (4202, "AGD66"),
            (4203, "AGD84"),
            (4230, "ED50"),
            (4277, "OSGB36"),
        ] {
            reg.insert(code, ProjectionDatum::new(GEODETIC, datum));
        }

        for zone in 1..=60u32 {
            reg.insert(32600 + zone, ProjectionDatum::new(format!("NUTM{:02}", zone), "WGS84"));
            reg.insert(32700 + zone, ProjectionDatum::new(format!("SUTM{:02}", zone), "WGS84"));
        }
        for zone in 1..=23u32 {
            reg.insert(26900 + zone, ProjectionDatum::new(format!("NUTM{:02}", zone), "NAD83"));
        }
        for zone in 1..=22u32 {
            reg.insert(26700 + zone, ProjectionDatum::new(format!("NUTM{:02}", zone), "NAD27"));
        }
        for zone in 48..=58u32 {
            reg.insert(28300 + zone, ProjectionDatum::new(format!("MGA{}", zone), "GDA94"));
        }

        reg
    }

    pub fn insert(&mut self, code: u32, codes: ProjectionDatum) {
        self.entries.insert(code, codes);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CrsRegistry for StaticRegistry {
    fn lookup(&self, code: u32) -> Option<ProjectionDatum> {
        self.entries.get(&code).cloned()
    }
}

impl<R: CrsRegistry + ?Sized> CrsRegistry for Box<R> {
    fn lookup(&self, code: u32) -> Option<ProjectionDatum> {
        (**self).lookup(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_utm() {
        let reg = StaticRegistry::builtin();
        assert_eq!(
            reg.lookup(32633),
            Some(ProjectionDatum::new("NUTM33", "WGS84"))
        );
        assert_eq!(
            reg.lookup(32755),
            Some(ProjectionDatum::new("SUTM55", "WGS84"))
        );
        assert_eq!(reg.lookup(28355), Some(ProjectionDatum::new("MGA55", "GDA94")));
        assert_eq!(reg.lookup(4326), Some(ProjectionDatum::new("GEODETIC", "WGS84")));
        assert_eq!(reg.lookup(1), None);
    }

    #[test]
    fn test_empty_registry() {
        assert_eq!(EmptyRegistry.lookup(4326), None);
    }
}
