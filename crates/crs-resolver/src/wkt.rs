//! A small WKT reader for coordinate reference systems.
//!
//! Reads both WKT1 (`GEOGCS[...]`, `PROJCS[...]`) and the common WKT2
//! keywords (`GEOGCRS`, `PROJCRS`, `ID[...]`) into a generic node tree,
//! then answers the handful of questions the resolver needs.

use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, recognize},
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, pair},
    IResult,
};

use crate::error::WktError;

/// One value inside a WKT node's brackets.
#[derive(Debug, Clone, PartialEq)]
pub enum WktValue {
    /// A quoted string (`""` unescaped to `"`).
    Text(String),
    /// A number, kept as written.
    Number(String),
    /// A bare keyword such as `NORTH` or `EAST`.
    Keyword(String),
    Node(WktNode),
}

impl WktValue {
    /// Textual form of a text, number or keyword value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WktValue::Text(s) | WktValue::Number(s) | WktValue::Keyword(s) => Some(s),
            WktValue::Node(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WktValue::Number(s) | WktValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// A `KEYWORD[value, value, ...]` node.
#[derive(Debug, Clone, PartialEq)]
pub struct WktNode {
    pub keyword: String,
    pub values: Vec<WktValue>,
}

impl WktNode {
    pub fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }

    pub fn is_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.is(k))
    }

    /// First non-node value, normally the node's name.
    pub fn name(&self) -> Option<&str> {
        self.values.first().and_then(WktValue::as_str)
    }

    pub fn children(&self) -> impl Iterator<Item = &WktNode> {
        self.values.iter().filter_map(|v| match v {
            WktValue::Node(n) => Some(n),
            _ => None,
        })
    }

    /// First direct child with one of the given keywords.
    pub fn child(&self, keywords: &[&str]) -> Option<&WktNode> {
        self.children().find(|n| n.is_any(keywords))
    }

    /// Depth-first search including this node.
    pub fn find(&self, keywords: &[&str]) -> Option<&WktNode> {
        if self.is_any(keywords) {
            return Some(self);
        }
        self.children().find_map(|n| n.find(keywords))
    }

    /// `(authority name, code)` from a direct `AUTHORITY[...]` or `ID[...]` child.
    pub fn authority(&self) -> Option<(&str, &str)> {
        let node = self.child(&["AUTHORITY", "ID"])?;
        let name = node.values.first()?.as_str()?;
        let code = node.values.get(1)?.as_str()?;
        Some((name, code))
    }
}

// ===== Parsing =====

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn keyword(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn quoted(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('"')(input)?;
    let mut out = String::new();
    loop {
        let (r, chunk) = take_while(|c| c != '"')(rest)?;
        out.push_str(chunk);
        let (r, _) = char('"')(r)?;
        let doubled: IResult<&str, char> = char('"')(r);
        match doubled {
            Ok((r, _)) => {
                out.push('"');
                rest = r;
            }
            Err(_) => return Ok((r, out)),
        }
    }
}

fn node(input: &str) -> IResult<&str, WktNode> {
    let (input, name) = ws(keyword)(input)?;
    let (input, open) = one_of("[(")(input)?;
    let close = if open == '[' { ']' } else { ')' };
    let (input, values) = separated_list0(ws(char(',')), value)(input)?;
    let (input, _) = ws(char(close))(input)?;
    Ok((
        input,
        WktNode {
            keyword: name.to_string(),
            values,
        },
    ))
}

fn value(input: &str) -> IResult<&str, WktValue> {
    ws(alt((
        map(quoted, WktValue::Text),
        map(node, WktValue::Node),
        map(recognize_float, |s: &str| WktValue::Number(s.to_string())),
        map(keyword, |s: &str| WktValue::Keyword(s.to_string())),
    )))(input)
}

/// Parse WKT text into its root node.
pub fn parse(text: &str) -> Result<WktNode, WktError> {
    if text.trim().is_empty() {
        return Err(WktError::Empty);
    }
    match all_consuming(ws(node))(text) {
        Ok((_, root)) => Ok(root),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(WktError::malformed(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(WktError::malformed("")),
    }
}

// ===== Spatial reference queries =====

const LOCAL: &[&str] = &["LOCAL_CS", "ENGCRS", "ENGINEERINGCRS"];
const PROJECTED: &[&str] = &["PROJCS", "PROJCRS", "PROJECTEDCRS"];
const GEOGRAPHIC: &[&str] = &["GEOGCS", "GEOGCRS", "GEOGRAPHICCRS", "GEODCRS", "GEODETICCRS"];
const BASE_GEOGRAPHIC: &[&str] = &[
    "GEOGCS",
    "GEOGCRS",
    "GEOGRAPHICCRS",
    "GEODCRS",
    "GEODETICCRS",
    "BASEGEOGCRS",
    "BASEGEODCRS",
];
const DATUM: &[&str] = &["DATUM", "GEODETICDATUM", "TRF"];

const UTM_NORTH_FALSE_NORTHING: f64 = 0.0;
const UTM_SOUTH_FALSE_NORTHING: f64 = 10_000_000.0;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_SCALE: f64 = 0.9996;

/// A parsed coordinate reference system.
#[derive(Debug, Clone)]
pub struct SpatialReference {
    root: WktNode,
}

impl SpatialReference {
    pub fn from_wkt(text: &str) -> Result<Self, WktError> {
        Ok(Self { root: parse(text)? })
    }

    pub fn root(&self) -> &WktNode {
        &self.root
    }

    /// A purely local (engineering) system with no georeferencing.
    pub fn is_local(&self) -> bool {
        self.root.is_any(LOCAL)
    }

    pub fn is_projected(&self) -> bool {
        self.root.is_any(PROJECTED)
    }

    pub fn is_geographic(&self) -> bool {
        self.root.is_any(GEOGRAPHIC)
    }

    /// Name of the geographic system (the root itself, or the one inside a
    /// projected system).
    pub fn geogcs_name(&self) -> Option<&str> {
        self.root.find(BASE_GEOGRAPHIC).and_then(WktNode::name)
    }

    pub fn datum_name(&self) -> Option<&str> {
        self.root.find(DATUM).and_then(WktNode::name)
    }

    pub fn projcs_name(&self) -> Option<&str> {
        if self.is_projected() {
            self.root.name()
        } else {
            None
        }
    }

    /// Authority of the top-level projected or geographic system.
    pub fn top_level_authority(&self) -> Option<(&str, &str)> {
        if self.is_projected() || self.is_geographic() {
            self.root.authority()
        } else {
            None
        }
    }

    /// Positive EPSG code of the top-level system, if it declares one.
    pub fn epsg_code(&self) -> Option<u32> {
        let (name, code) = self.top_level_authority()?;
        if !name.eq_ignore_ascii_case("EPSG") {
            return None;
        }
        match code.trim().parse::<i64>() {
            Ok(n) if n > 0 && n <= u32::MAX as i64 => Some(n as u32),
            _ => None,
        }
    }

    /// Name of the projection method (`Transverse_Mercator`, ...).
    pub fn projection_method(&self) -> Option<&str> {
        if !self.is_projected() {
            return None;
        }
        if let Some(p) = self.root.child(&["PROJECTION"]) {
            return p.name();
        }
        self.root
            .child(&["CONVERSION"])
            .and_then(|c| c.child(&["METHOD", "PROJECTION"]))
            .and_then(WktNode::name)
    }

    /// Value of a projection parameter, matched on a normalised name
    /// (case-insensitive, spaces treated as underscores).
    pub fn parameter(&self, names: &[&str]) -> Option<f64> {
        let holder = self.root.child(&["CONVERSION"]).unwrap_or(&self.root);
        holder
            .children()
            .filter(|n| n.is("PARAMETER"))
            .find(|n| {
                n.name()
                    .map(normalise)
                    .map(|name| names.iter().any(|want| name == normalise(want)))
                    .unwrap_or(false)
            })
            .and_then(|n| n.values.get(1))
            .and_then(WktValue::as_f64)
    }

    /// `(zone, north)` when this is a Transverse Mercator system with UTM
    /// parameters.
    pub fn utm_zone(&self) -> Option<(u32, bool)> {
        let method = normalise(self.projection_method()?);
        if method != "transverse_mercator" {
            return None;
        }

        let lat0 = self
            .parameter(&["latitude_of_origin", "latitude_of_natural_origin"])
            .unwrap_or(0.0);
        let central = self.parameter(&["central_meridian", "longitude_of_natural_origin"])?;
        let scale = self
            .parameter(&["scale_factor", "scale_factor_at_natural_origin"])
            .unwrap_or(1.0);
        let false_easting = self.parameter(&["false_easting"]).unwrap_or(0.0);
        let false_northing = self.parameter(&["false_northing"]).unwrap_or(0.0);

        if lat0 != 0.0
            || (scale - UTM_SCALE).abs() > 1e-8
            || (false_easting - UTM_FALSE_EASTING).abs() > 1e-3
        {
            return None;
        }

        let north = if false_northing == UTM_NORTH_FALSE_NORTHING {
            true
        } else if false_northing == UTM_SOUTH_FALSE_NORTHING {
            false
        } else {
            return None;
        };

        let zone = ((central + 186.0) / 6.0).floor();
        if !(1.0..=60.0).contains(&zone) || (central - (zone * 6.0 - 183.0)).abs() > 1e-5 {
            return None;
        }

        Some((zone as u32, north))
    }
}

fn normalise(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}
