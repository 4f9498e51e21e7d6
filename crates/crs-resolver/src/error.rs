//! Error types for WKT parsing.

use thiserror::Error;

/// Errors raised while reading coordinate-system text.
#[derive(Debug, Error)]
pub enum WktError {
    #[error("empty WKT text")]
    Empty,

    #[error("malformed WKT near {near:?}")]
    Malformed { near: String },

    #[error("failed to read coordinate-system table: {0}")]
    Table(#[from] std::io::Error),
}

impl WktError {
    pub(crate) fn malformed(rest: &str) -> Self {
        let near: String = rest.chars().take(32).collect();
        Self::Malformed { near }
    }
}
