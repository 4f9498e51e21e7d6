//! Process-wide encoder configuration.

use std::path::PathBuf;

use crs_resolver::{CrsResolver, CsTable, StaticRegistry};
use raster_common::{EncodeError, EncodeResult};
use tracing::debug;

/// Knobs that apply to every encoding session in the process.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    /// Reject sample types the container does not take natively instead of
    /// coercing them.
    pub strict: bool,

    /// Extra `NAME=ENTRY` coordinate-system table merged over the built-in one.
    pub cs_table_path: Option<PathBuf>,

    /// Minimum width and height of an ECW destination.
    pub min_ecw_size: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            strict: false,
            cs_table_path: None,
            min_ecw_size: 128,
        }
    }
}

impl EncoderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RASTER_ENCODE_STRICT") {
            config.strict = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("RASTER_ENCODE_CS_TABLE") {
            if !val.is_empty() {
                config.cs_table_path = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("RASTER_ENCODE_MIN_ECW_SIZE") {
            if let Ok(size) = val.parse() {
                config.min_ecw_size = size;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_ecw_size == 0 {
            return Err("min_ecw_size must be > 0".to_string());
        }

        if let Some(path) = &self.cs_table_path {
            if !path.is_file() {
                return Err(format!(
                    "coordinate system table {} does not exist",
                    path.display()
                ));
            }
        }

        Ok(())
    }

    /// Build a resolver over the built-in registry and the configured table.
    pub fn resolver(&self) -> EncodeResult<CrsResolver> {
        let mut table = CsTable::builtin();
        if let Some(path) = &self.cs_table_path {
            let extra = CsTable::load(path).map_err(|e| {
                EncodeError::configuration(format!(
                    "failed to load coordinate system table {}: {}",
                    path.display(),
                    e
                ))
            })?;
            debug!(path = %path.display(), entries = extra.len(), "Merging coordinate system table");
            table.merge(extra);
        }
        Ok(CrsResolver::new(StaticRegistry::builtin(), table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_validates() {
        let config = EncoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_ecw_size, 128);
        assert!(!config.strict);
    }

    #[test]
    fn test_zero_min_size_rejected() {
        let config = EncoderConfig {
            min_ecw_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_table_rejected() {
        let config = EncoderConfig {
            cs_table_path: Some(PathBuf::from("/nonexistent/coordsys.txt")),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(config.resolver().is_err());
    }

    #[test]
    fn test_extra_table_merged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# site table").unwrap();
        writeln!(file, "LOCALGRID=PROJCS[\"LOCALGRID\",GEOGCS[\"WGS84\"]]").unwrap();
        file.flush().unwrap();

        let config = EncoderConfig {
            cs_table_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let resolver = config.resolver().unwrap();
        assert!(resolver.table().is_projection("LOCALGRID"));
        assert!(resolver.table().is_datum("WGS84"));
    }
}
