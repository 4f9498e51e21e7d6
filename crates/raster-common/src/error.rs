//! Error types for raster encoding sessions.

use thiserror::Error;

/// Result type alias using EncodeError.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Primary error type for an encoding session.
///
/// Every variant aborts the current session; nothing is retried.
#[derive(Debug, Error)]
pub enum EncodeError {
    // === Rejected before any codec resource is touched ===
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    // === Session failures ===
    #[error("I/O error: {0}")]
    Io(String),

    #[error(
        "apparent attempt to write non-sequentially: loaded line is {loaded_line}, \
         but line {line} of band {band} was written to"
    )]
    Sequencing {
        loaded_line: i64,
        line: usize,
        band: usize,
    },

    #[error("line {line} flushed before band {band} was written")]
    IncompleteLine { line: usize, band: usize },

    #[error("scanline write failed: {0}")]
    Codec(String),

    #[error("encoding cancelled by progress callback")]
    Cancelled,

    #[error("session already aborted by an earlier error")]
    SessionAborted,
}

impl EncodeError {
    /// Create a Configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an UnsupportedType error.
    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Create an Io error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// True for errors raised by validation rather than by a running session.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EncodeError::Configuration(_) | EncodeError::UnsupportedType(_)
        )
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> Self {
        EncodeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        EncodeError::Io(format!("JSON error: {}", err))
    }
}
