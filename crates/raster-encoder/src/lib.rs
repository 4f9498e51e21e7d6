//! Sequential scanline encoding into compressed, georeferenced containers.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   pull (codec asks for line n)   ┌────────────────┐
//! │  CopyDriver    │ ───────────────────────────────> │                │
//! │  SourceRaster  │                                  │   Compressor   │ ──> Codec
//! └────────────────┘                                  │                │    (append-only)
//! ┌────────────────┐   push (one assembled line)      │                │
//! │ ScanlineWriter │ ───────────────────────────────> │                │
//! │  BIL buffer    │                                  └────────────────┘
//! └────────────────┘                                          │
//!                                                     CrsResolver (WKT -> codes)
//! ```
//!
//! Both paths end in [`Codec::write_line`]; line indices reach the codec
//! strictly increasing from 0 with no gaps.
//!
//! # Example
//!
//! ```ignore
//! use raster_encoder::{ContainerCodec, ContainerKind, CopyDriver, EncoderConfig,
//!                      EncodingOptions, MemRaster, Progress};
//!
//! let driver = CopyDriver::new(EncoderConfig::from_env())?;
//! let options = EncodingOptions::from_strings(&["TARGET=90"])?;
//! let dataset = driver.create_copy(
//!     ContainerCodec::new(ContainerKind::Jpeg2000),
//!     "out.jp2",
//!     &raster,
//!     ContainerKind::Jpeg2000,
//!     &options,
//!     Progress::none(),
//! )?;
//! ```

pub mod codec;
pub mod compressor;
pub mod config;
pub mod copy;
pub mod dataset;
pub mod destination;
pub mod options;
pub mod progress;
pub mod scanline;
pub mod source;

pub use codec::{
    BandInfo, CellSizeUnits, Codec, CodecError, CodecParameter, ColorSpace, ContainerCodec,
    ContainerHeader, FileInfo, LineProvider, OutputTarget, Profile, Progression, SubfileWindow,
};
pub use compressor::{Compressor, EncoderState, InitParams};
pub use config::EncoderConfig;
pub use copy::CopyDriver;
pub use dataset::EncodedDataset;
pub use destination::Destination;
pub use options::{ContainerKind, EncodingOptions, Jpeg2000Options};
pub use progress::Progress;
pub use scanline::ScanlineWriter;
pub use source::{MemRaster, PixelSource, SourceRaster};

pub use raster_common::{EncodeError, EncodeResult};
