//! Named coordinate-system table.
//!
//! Each entry maps a container datum or projection name to its WKT. Only
//! the leading tag of the WKT matters to the resolver: a `GEOGCS` entry
//! names a datum, a `PROJCS` entry names a projection.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::WktError;

const BUILTIN_TABLE: &str = r#"
# Datums
WGS84=GEOGCS["WGS84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
WGS72DOD=GEOGCS["WGS72DOD",DATUM["WGS_1972",SPHEROID["WGS 72",6378135,298.26]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
NAD27=GEOGCS["NAD27",DATUM["North_American_Datum_1927",SPHEROID["Clarke 1866",6378206.4,294.9786982138982]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
NAD83=GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
GDA94=GEOGCS["GDA94",DATUM["Geocentric_Datum_of_Australia_1994",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
AGD66=GEOGCS["AGD66",DATUM["Australian_Geodetic_Datum_1966",SPHEROID["Australian National Spheroid",6378160,298.25]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
AGD84=GEOGCS["AGD84",DATUM["Australian_Geodetic_Datum_1984",SPHEROID["Australian National Spheroid",6378160,298.25]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
ED50=GEOGCS["ED50",DATUM["European_Datum_1950",SPHEROID["International 1924",6378388,297]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
OSGB36=GEOGCS["OSGB36",DATUM["OSGB_1936",SPHEROID["Airy 1830",6377563.396,299.3249646]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]
NZGD2000=GEOGCS["NZGD2000",DATUM["New_Zealand_Geodetic_Datum_2000",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]]

# Projections
MGA54=PROJCS["MGA54",GEOGCS["GDA94"],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",141]]
MGA55=PROJCS["MGA55",GEOGCS["GDA94"],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",147]]
MGA56=PROJCS["MGA56",GEOGCS["GDA94"],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",153]]
NZMG=PROJCS["NZMG",GEOGCS["NZGD49"],PROJECTION["New_Zealand_Map_Grid"]]
OSGB=PROJCS["OSGB",GEOGCS["OSGB36"],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",-2]]
"#;

/// Case-insensitive name -> WKT table.
#[derive(Debug, Clone, Default)]
pub struct CsTable {
    entries: HashMap<String, String>,
}

impl CsTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the crate.
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_TABLE)
    }

    /// Parse `NAME=WKT` lines. Blank lines and `#` comments are skipped, as
    /// are lines without `=`.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((name, entry)) = line.split_once('=') {
                table.insert(name.trim(), entry.trim());
            }
        }
        table
    }

    /// Load a table file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WktError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let table = Self::parse(&text);
        debug!(path = %path.as_ref().display(), entries = table.len(), "Loaded coordinate-system table");
        Ok(table)
    }

    pub fn insert(&mut self, name: &str, entry: &str) {
        self.entries.insert(name.to_uppercase(), entry.to_string());
    }

    /// Add every entry of `other`, replacing same-named ones.
    pub fn merge(&mut self, other: CsTable) {
        self.entries.extend(other.entries);
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_uppercase()).map(String::as_str)
    }

    /// True when `name` is listed as a geographic system.
    pub fn is_datum(&self, name: &str) -> bool {
        self.lookup(name)
            .map(|entry| starts_with_tag(entry, "GEOGCS"))
            .unwrap_or(false)
    }

    /// True when `name` is listed as a projected system.
    pub fn is_projection(&self, name: &str) -> bool {
        self.lookup(name)
            .map(|entry| starts_with_tag(entry, "PROJCS"))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn starts_with_tag(entry: &str, tag: &str) -> bool {
    entry
        .get(..tag.len())
        .map(|head| head.eq_ignore_ascii_case(tag))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tags() {
        let table = CsTable::builtin();
        assert!(table.is_datum("WGS84"));
        assert!(table.is_datum("gda94"));
        assert!(!table.is_projection("GDA94"));
        assert!(table.is_projection("MGA55"));
        assert!(!table.is_datum("WGS 84"));
    }

    #[test]
    fn test_parse_and_merge() {
        let mut table = CsTable::parse("# comment\n\nFOO=GEOGCS[\"FOO\"]\nbroken line\nBAR = PROJCS[\"BAR\"]\n");
        assert_eq!(table.len(), 2);
        assert!(table.is_datum("foo"));
        assert!(table.is_projection("BAR"));

        table.merge(CsTable::parse("FOO=PROJCS[\"FOO\"]"));
        assert!(table.is_projection("FOO"));
        assert!(!table.is_datum("FOO"));
    }
}
