//! Raster encoding CLI.
//!
//! Encodes raw band-sequential rasters into ECW or JPEG2000 family
//! containers and describes existing containers.

mod raw;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use raster_common::{RasterGeometry, SampleType};
use raster_encoder::{
    ContainerCodec, ContainerKind, CopyDriver, EncodedDataset, EncoderConfig, EncodingOptions,
    Progress, ScanlineWriter, SourceRaster,
};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "raster-encode")]
#[command(about = "Encode rasters into compressed, georeferenced containers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a raw band-sequential raster
    Encode {
        /// Raw input file (band sequential, native-endian)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long)]
        width: usize,

        #[arg(long)]
        height: usize,

        #[arg(long, default_value = "1")]
        bands: usize,

        /// Sample type name (Byte, Int16, UInt16, Int32, UInt32, Float32, ...)
        #[arg(long = "type", default_value = "Byte")]
        sample_type: String,

        /// Destination file or SUBFILE:<offset>,<length>,<file>
        #[arg(short, long)]
        output: String,

        /// Container family: ecw or jp2 (default: from the output extension)
        #[arg(short, long)]
        format: Option<String>,

        /// File holding the coordinate system as WKT
        #[arg(long)]
        wkt_file: Option<PathBuf>,

        /// Six-term geotransform: origin_x,pixel_x,rot,origin_y,rot,pixel_y
        #[arg(long, allow_hyphen_values = true)]
        geo_transform: Option<String>,

        /// Creation option KEY=VALUE (repeatable)
        #[arg(long = "co", value_name = "KEY=VALUE")]
        creation_options: Vec<String>,

        /// Reject sample types the container does not take natively
        #[arg(long, env = "RASTER_ENCODE_STRICT")]
        strict: bool,

        /// Write line by line through the scanline writer instead of copying
        #[arg(long)]
        incremental: bool,
    },

    /// Describe an encoded container
    Info {
        /// Destination file or SUBFILE:<offset>,<length>,<file>
        destination: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json)?;

    match cli.command {
        Commands::Encode {
            input,
            width,
            height,
            bands,
            sample_type,
            output,
            format,
            wkt_file,
            geo_transform,
            creation_options,
            strict,
            incremental,
        } => {
            let sample_type = SampleType::from_name(&sample_type)
                .with_context(|| format!("unknown sample type '{}'", sample_type))?;
            let kind = match format {
                Some(name) => ContainerKind::from_name(&name)
                    .with_context(|| format!("unknown format '{}'", name))?,
                None if output.to_lowercase().ends_with(".ecw") => ContainerKind::Ecw,
                None => ContainerKind::Jpeg2000,
            };

            let geometry = RasterGeometry::new(width, height, bands, sample_type);
            let mut raster = raw::read_raw(&input, geometry)?;
            if let Some(path) = wkt_file {
                let wkt = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                raster = raster.with_projection(wkt.trim());
            }
            if let Some(text) = geo_transform {
                raster = raster.with_geo_reference(raw::parse_geo_transform(&text)?);
            }

            let options = EncodingOptions::from_strings(creation_options.as_slice())?;

            let mut config = EncoderConfig::from_env();
            config.strict = strict;
            if let Err(e) = config.validate() {
                bail!("invalid configuration: {}", e);
            }

            info!(
                input = %input.display(),
                output = %output,
                kind = %kind,
                incremental,
                "Encoding raster"
            );

            if incremental {
                encode_incremental(&config, &raster, &output, kind, options)?;
            } else {
                encode_copy(config, &raster, &output, kind, &options)?;
            }

            let ds = EncodedDataset::open(&output)?;
            info!(
                lines = ds.lines_written(),
                projection = ds.projection(),
                datum = ds.datum(),
                "Encoding complete"
            );
            Ok(())
        }
        Commands::Info { destination } => {
            let ds = EncodedDataset::open(&destination)?;
            let report = serde_json::json!({
                "destination": destination,
                "kind": ds.kind().to_string(),
                "lines_written": ds.lines_written(),
                "complete": ds.is_complete(),
                "header": ds.header(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Logs every tenth of the way.
fn decile_progress<'a>() -> Progress<'a> {
    let mut next = 0.0;
    Progress::new(move |fraction, _| {
        if fraction >= next {
            debug!(percent = (fraction * 100.0).round(), "Progress");
            next = (fraction * 10.0).floor() / 10.0 + 0.1;
        }
        true
    })
}

fn encode_copy(
    config: EncoderConfig,
    raster: &raster_encoder::MemRaster,
    output: &str,
    kind: ContainerKind,
    options: &EncodingOptions,
) -> Result<()> {
    let driver = CopyDriver::new(config)?;
    driver.create_copy(
        ContainerCodec::new(kind),
        output,
        raster,
        kind,
        options,
        decile_progress(),
    )?;
    Ok(())
}

fn encode_incremental(
    config: &EncoderConfig,
    raster: &raster_encoder::MemRaster,
    output: &str,
    kind: ContainerKind,
    options: EncodingOptions,
) -> Result<()> {
    let geometry = raster.geometry();
    let resolver = Arc::new(config.resolver()?);
    let mut writer = ScanlineWriter::create(
        ContainerCodec::new(kind),
        resolver,
        output,
        geometry,
        kind,
        options,
    )?
    .with_progress(decile_progress());

    if let Some(wkt) = raster.projection_wkt() {
        writer.set_projection(wkt)?;
    }
    if let Some(geo) = raster.geo_reference() {
        writer.set_geo_reference(geo)?;
    }

    let row_bytes = geometry.row_bytes();
    for line in 0..geometry.height {
        for band in 0..geometry.band_count {
            let data = raster
                .band(band)
                .with_context(|| format!("band {} missing", band + 1))?;
            let start = line * row_bytes;
            writer.write_block(band, line, &data[start..start + row_bytes])?;
        }
    }
    writer.finish()?;
    Ok(())
}
