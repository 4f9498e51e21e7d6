//! Destination names.
//!
//! A destination is either a plain path or a subfile window inside an
//! existing host file, written as `SUBFILE:<offset>,<length>,<path>`
//! (`J2K_SUBFILE:` is accepted too, prefixes are case-insensitive).

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use raster_common::{EncodeError, EncodeResult};

use crate::codec::{OutputTarget, SubfileWindow};

const SUBFILE_PREFIXES: [&str; 2] = ["J2K_SUBFILE:", "SUBFILE:"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Path(PathBuf),
    Subfile {
        offset: u64,
        length: u64,
        path: PathBuf,
    },
}

impl Destination {
    pub fn parse(name: &str) -> EncodeResult<Self> {
        let prefixed = |p: &str| {
            name.get(..p.len())
                .map(|head| head.eq_ignore_ascii_case(p))
                .unwrap_or(false)
        };
        let Some(prefix) = SUBFILE_PREFIXES.into_iter().find(|&p| prefixed(p)) else {
            if name.is_empty() {
                return Err(EncodeError::configuration("empty destination name"));
            }
            return Ok(Destination::Path(PathBuf::from(name)));
        };

        let rest = &name[prefix.len()..];
        let mut parts = rest.splitn(3, ',');
        let (offset, length, path) = match (parts.next(), parts.next(), parts.next()) {
            (Some(o), Some(l), Some(p)) if !p.is_empty() => (o, l, p),
            _ => {
                return Err(EncodeError::configuration(format!(
                    "failed to parse subfile specification '{}'",
                    name
                )))
            }
        };

        let parse = |field: &str, what: &str| {
            field.trim().parse::<u64>().map_err(|_| {
                EncodeError::configuration(format!(
                    "subfile {} '{}' is not an unsigned integer in '{}'",
                    what, field, name
                ))
            })
        };

        Ok(Destination::Subfile {
            offset: parse(offset, "offset")?,
            length: parse(length, "length")?,
            path: PathBuf::from(path),
        })
    }

    pub fn is_subfile(&self) -> bool {
        matches!(self, Destination::Subfile { .. })
    }

    /// The real file behind the destination.
    pub fn file_path(&self) -> &Path {
        match self {
            Destination::Path(p) => p,
            Destination::Subfile { path, .. } => path,
        }
    }

    /// Lowercased extension of the real file, if any.
    pub fn extension(&self) -> Option<String> {
        self.file_path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Turn into a codec output target. Subfile hosts must already exist and
    /// are opened for update without truncation.
    pub fn into_target(self) -> EncodeResult<OutputTarget> {
        match self {
            Destination::Path(p) => Ok(OutputTarget::Path(p)),
            Destination::Subfile {
                offset,
                length,
                path,
            } => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(&path)
                    .map_err(|e| {
                        EncodeError::io(format!(
                            "failed to open subfile host {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                let window = SubfileWindow::new(file, path, offset, length)?;
                Ok(OutputTarget::Window(window))
            }
        }
    }
}
