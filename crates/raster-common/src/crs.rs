//! Projection and datum tokens in the container's closed vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel used when no projection or datum could be determined.
pub const RAW: &str = "RAW";

/// Projection token used for every geographic (lat/lon) system.
pub const GEODETIC: &str = "GEODETIC";

/// Longest token the container header can carry.
pub const MAX_TOKEN_LEN: usize = 127;

/// A (projection, datum) pair as written into the container header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionDatum {
    pub projection: String,
    pub datum: String,
}

impl ProjectionDatum {
    /// Create a pair, truncating each token to `MAX_TOKEN_LEN` bytes.
    pub fn new(projection: impl Into<String>, datum: impl Into<String>) -> Self {
        Self {
            projection: bounded(projection.into()),
            datum: bounded(datum.into()),
        }
    }

    /// The RAW/RAW pair.
    pub fn raw() -> Self {
        Self::new(RAW, RAW)
    }

    pub fn is_raw_projection(&self) -> bool {
        self.projection.eq_ignore_ascii_case(RAW)
    }

    pub fn is_raw_datum(&self) -> bool {
        self.datum.eq_ignore_ascii_case(RAW)
    }

    pub fn set_projection(&mut self, projection: impl Into<String>) {
        self.projection = bounded(projection.into());
    }

    pub fn set_datum(&mut self, datum: impl Into<String>) {
        self.datum = bounded(datum.into());
    }
}

impl Default for ProjectionDatum {
    fn default() -> Self {
        Self::raw()
    }
}

impl fmt::Display for ProjectionDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PROJ={}, DATUM={}", self.projection, self.datum)
    }
}

fn bounded(mut token: String) -> String {
    if token.len() > MAX_TOKEN_LEN {
        let mut cut = MAX_TOKEN_LEN;
        while !token.is_char_boundary(cut) {
            cut -= 1;
        }
        token.truncate(cut);
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_raw() {
        let pd = ProjectionDatum::default();
        assert!(pd.is_raw_projection());
        assert!(pd.is_raw_datum());
        assert_eq!(pd.to_string(), "PROJ=RAW, DATUM=RAW");
    }

    #[test]
    fn test_tokens_are_bounded() {
        let long = "X".repeat(300);
        let pd = ProjectionDatum::new(long.clone(), "WGS84");
        assert_eq!(pd.projection.len(), MAX_TOKEN_LEN);

        let mut pd = ProjectionDatum::raw();
        pd.set_datum(long);
        assert_eq!(pd.datum.len(), MAX_TOKEN_LEN);
    }
}
