//! Typed encoding options.
//!
//! Options arrive as `KEY=VALUE` strings. They are parsed once into
//! [`EncodingOptions`]; every recognized key is validated here so nothing
//! downstream compares option strings.

use raster_common::{EncodeError, EncodeResult};
use std::fmt;

use crate::codec::{CodecParameter, Profile, Progression};

/// Default quality target.
pub const DEFAULT_TARGET: f32 = 75.0;

/// Container family being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Ecw,
    Jpeg2000,
}

impl ContainerKind {
    /// Four-byte magic of the reference container.
    pub fn magic(&self) -> &'static [u8; 4] {
        match self {
            ContainerKind::Ecw => b"ECWR",
            ContainerKind::Jpeg2000 => b"JP2R",
        }
    }

    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        match magic {
            b"ECWR" => Some(ContainerKind::Ecw),
            b"JP2R" => Some(ContainerKind::Jpeg2000),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ecw" => Some(ContainerKind::Ecw),
            "jp2" | "jpeg2000" | "jp2ecw" => Some(ContainerKind::Jpeg2000),
            _ => None,
        }
    }

    /// Only the JPEG2000 family takes structural tuning parameters.
    pub fn accepts_tuning(&self) -> bool {
        matches!(self, ContainerKind::Jpeg2000)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Ecw => write!(f, "ECW"),
            ContainerKind::Jpeg2000 => write!(f, "JPEG2000"),
        }
    }
}

/// Structural parameters of the JPEG2000 family. `None` leaves the codec
/// default in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Jpeg2000Options {
    pub profile: Option<Profile>,
    pub codestream_only: Option<bool>,
    pub levels: Option<u32>,
    pub layers: Option<u32>,
    pub precinct_width: Option<u32>,
    pub precinct_height: Option<u32>,
    pub tile_width: Option<u32>,
    pub tile_height: Option<u32>,
    pub include_sop: Option<bool>,
    pub include_eph: Option<bool>,
    pub progression: Option<Progression>,
    pub decompress_layers: Option<u32>,
    pub decompress_reconstruction_parameter: Option<f32>,
}

impl Jpeg2000Options {
    /// Parameters to hand the codec, in a fixed order.
    pub fn codec_parameters(&self) -> Vec<CodecParameter> {
        let mut params = Vec::new();
        if let Some(p) = self.profile {
            params.push(CodecParameter::Profile(p));
        }
        if let Some(v) = self.codestream_only {
            params.push(CodecParameter::CodestreamOnly(v));
        }
        if let Some(v) = self.levels {
            params.push(CodecParameter::Levels(v));
        }
        if let Some(v) = self.layers {
            params.push(CodecParameter::Layers(v));
        }
        if let Some(v) = self.precinct_width {
            params.push(CodecParameter::PrecinctWidth(v));
        }
        if let Some(v) = self.precinct_height {
            params.push(CodecParameter::PrecinctHeight(v));
        }
        if let Some(v) = self.tile_width {
            params.push(CodecParameter::TileWidth(v));
        }
        if let Some(v) = self.tile_height {
            params.push(CodecParameter::TileHeight(v));
        }
        if let Some(v) = self.include_sop {
            params.push(CodecParameter::IncludeSop(v));
        }
        if let Some(v) = self.include_eph {
            params.push(CodecParameter::IncludeEph(v));
        }
        if let Some(p) = self.progression {
            params.push(CodecParameter::Progression(p));
        }
        if let Some(v) = self.decompress_layers {
            params.push(CodecParameter::DecompressLayers(v));
        }
        if let Some(v) = self.decompress_reconstruction_parameter {
            params.push(CodecParameter::ReconstructionParameter(v));
        }
        params
    }
}

/// Validated encoding options.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingOptions {
    /// Quality target, 1 to 100.
    pub target: f32,
    /// Explicit projection override (`PROJ`).
    pub projection: Option<String>,
    /// Explicit datum override (`DATUM`).
    pub datum: Option<String>,
    pub jpeg2000: Jpeg2000Options,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
            projection: None,
            datum: None,
            jpeg2000: Jpeg2000Options::default(),
        }
    }
}

impl EncodingOptions {
    /// Build from `KEY=VALUE` strings. Entries without `=` are ignored.
    pub fn from_strings<S: AsRef<str>>(items: &[S]) -> EncodeResult<Self> {
        let pairs: Vec<(&str, &str)> = items
            .iter()
            .filter_map(|s| s.as_ref().split_once('='))
            .collect();
        Self::from_pairs(pairs)
    }

    /// Build from key/value pairs. Keys are case-insensitive, the first
    /// occurrence of a key wins and unknown keys are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> EncodeResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut opts = Self::default();
        let mut seen: Vec<String> = Vec::new();

        for (key, value) in pairs {
            let key = key.trim().to_uppercase();
            if seen.contains(&key) {
                continue;
            }
            let value = value.trim();

            match key.as_str() {
                "TARGET" => opts.target = parse_float(&key, value)?,
                "PROJ" => opts.projection = Some(value.to_string()),
                "DATUM" => opts.datum = Some(value.to_string()),
                "PROFILE" => {
                    opts.jpeg2000.profile = Some(Profile::from_tag(value).ok_or_else(|| {
                        EncodeError::configuration(format!("unsupported PROFILE value '{}'", value))
                    })?)
                }
                "PROGRESSION" => {
                    opts.jpeg2000.progression = Some(Progression::from_tag(value).ok_or_else(|| {
                        EncodeError::configuration(format!(
                            "unsupported PROGRESSION value '{}'",
                            value
                        ))
                    })?)
                }
                "CODESTREAM_ONLY" => opts.jpeg2000.codestream_only = Some(parse_bool(value)),
                "INCLUDE_SOP" => opts.jpeg2000.include_sop = Some(parse_bool(value)),
                "INCLUDE_EPH" => opts.jpeg2000.include_eph = Some(parse_bool(value)),
                "LEVELS" => opts.jpeg2000.levels = Some(parse_uint(&key, value)?),
                "LAYERS" => opts.jpeg2000.layers = Some(parse_uint(&key, value)?),
                "PRECINCT_WIDTH" => opts.jpeg2000.precinct_width = Some(parse_uint(&key, value)?),
                "PRECINCT_HEIGHT" => opts.jpeg2000.precinct_height = Some(parse_uint(&key, value)?),
                "TILE_WIDTH" => opts.jpeg2000.tile_width = Some(parse_uint(&key, value)?),
                "TILE_HEIGHT" => opts.jpeg2000.tile_height = Some(parse_uint(&key, value)?),
                "DECOMPRESS_LAYERS" => opts.jpeg2000.decompress_layers = Some(parse_uint(&key, value)?),
                "DECOMPRESS_RECONSTRUCTION_PARAMETER" => {
                    opts.jpeg2000.decompress_reconstruction_parameter = Some(parse_float(&key, value)?)
                }
                _ => continue,
            }
            seen.push(key);
        }

        opts.validate()?;
        Ok(opts)
    }

    /// Check ranges that parsing alone does not enforce.
    pub fn validate(&self) -> EncodeResult<()> {
        if !(1.0..=100.0).contains(&self.target) {
            return Err(EncodeError::configuration(format!(
                "TARGET={} is not supported, legal range is 1 to 100",
                self.target
            )));
        }
        Ok(())
    }

    /// Integer compression ratio derived from the quality target.
    ///
    /// A target of 100 asks for lossless output, which has no finite ratio.
    pub fn compression_ratio(&self) -> u32 {
        let ratio = 100.0 / (100.0 - self.target);
        if !ratio.is_finite() {
            return u32::MAX;
        }
        (ratio as u32).max(1)
    }
}

fn parse_bool(value: &str) -> bool {
    !matches!(
        value.to_uppercase().as_str(),
        "NO" | "FALSE" | "OFF" | "0"
    )
}

fn parse_uint(key: &str, value: &str) -> EncodeResult<u32> {
    value.parse::<u32>().map_err(|_| {
        EncodeError::configuration(format!("{}={} is not an unsigned integer", key, value))
    })
}

fn parse_float(key: &str, value: &str) -> EncodeResult<f32> {
    match value.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(EncodeError::configuration(format!(
            "{}={} is not a number",
            key, value
        ))),
    }
}
