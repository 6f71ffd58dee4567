//!
//! Command-line interface for quantifying punctate sub-nuclear
//! structures in 3D fluorescence microscopy stacks.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use puncta_algorithms::{FociDetectorConfig, QuantifierConfig, ThresholdMethod};
use puncta_core::{Calibration, SizeMode};
use puncta_io::{
    discover_images, ChannelReader, MaskFileOracle, MaskFileOracleConfig, ReportWriter,
    TiffStackReader,
};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

mod pipeline;

use pipeline::{process_image, PipelineConfig};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    PunctaIo(#[from] puncta_io::Error),

    #[error("setup error: {0}")]
    Setup(String),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Automatic thresholding method selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    /// Triangle method (default, suited to sparse foci)
    Triangle,
    /// Otsu's between-class variance method
    Otsu,
    /// Mean intensity
    Mean,
    /// IsoData iterative intermeans
    Isodata,
}

impl From<Method> for ThresholdMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Triangle => ThresholdMethod::Triangle,
            Method::Otsu => ThresholdMethod::Otsu,
            Method::Mean => ThresholdMethod::Mean,
            Method::Isodata => ThresholdMethod::IsoData,
        }
    }
}

/// Measurement unit selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Unit {
    /// Report sizes as areas (µm²)
    Area,
    /// Report sizes as volumes (µm³)
    Volume,
}

impl From<Unit> for SizeMode {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Area => SizeMode::Area,
            Unit::Volume => SizeMode::Volume,
        }
    }
}

/// Quantification of punctate sub-nuclear structures.
#[derive(Parser)]
#[command(name = "puncta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze every stack in a folder and write the results report
    Process {
        /// Folder holding the image stacks
        input: PathBuf,

        /// Output folder for the report and composites
        #[arg(short, long)]
        output: PathBuf,

        /// Folder holding the nucleus label masks (defaults to the input folder)
        #[arg(long)]
        masks: Option<PathBuf>,

        /// Mask file suffix appended to each image stem
        #[arg(long, default_value = "_nuclei")]
        mask_suffix: String,

        /// Interleaved channels per stack
        #[arg(long, default_value = "2")]
        channels: usize,

        /// Channel index of the nucleus stain
        #[arg(long, default_value = "0")]
        nucleus_channel: usize,

        /// Channel index of the foci stain
        #[arg(long, default_value = "1")]
        foci_channel: usize,

        /// Lateral pixel size (µm)
        #[arg(long)]
        xy_cal: Option<f64>,

        /// Axial slice spacing (µm)
        #[arg(long, default_value = "1.0")]
        z_cal: f64,

        /// Measurement unit
        #[arg(long, value_enum, default_value = "area")]
        unit: Unit,

        /// Minimum nucleus size (µm² or µm³)
        #[arg(long, default_value = "50.0")]
        min_nucleus_size: f64,

        /// Maximum nucleus size (µm² or µm³)
        #[arg(long, default_value = "550.0")]
        max_nucleus_size: f64,

        /// Minimum focus size (µm² or µm³)
        #[arg(long, default_value = "0.05")]
        min_foci_size: f64,

        /// Maximum focus size (µm² or µm³)
        #[arg(long, default_value = "3.0")]
        max_foci_size: f64,

        /// Thresholding method for foci detection
        #[arg(long, value_enum, default_value = "triangle")]
        method: Method,

        /// Narrow band-pass sigma (voxels)
        #[arg(long, default_value = "1.0")]
        sigma1: f64,

        /// Wide band-pass sigma (voxels)
        #[arg(long, default_value = "3.0")]
        sigma2: f64,

        /// Lateral focus dilation for the diffuse measurement (voxels)
        #[arg(long, default_value = "2.0")]
        dilation: f64,

        /// Keep nuclei detected in a single Z slice
        #[arg(long)]
        keep_single_slice: bool,

        /// Parallel image workers (1 if the oracle is GPU-bound)
        #[arg(short, long, default_value = "1")]
        jobs: usize,
    },

    /// Show information about one image stack
    Info {
        /// Input stack
        input: PathBuf,

        /// Interleaved channels per stack
        #[arg(long, default_value = "1")]
        channels: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            masks,
            mask_suffix,
            channels,
            nucleus_channel,
            foci_channel,
            xy_cal,
            z_cal,
            unit,
            min_nucleus_size,
            max_nucleus_size,
            min_foci_size,
            max_foci_size,
            method,
            sigma1,
            sigma2,
            dilation,
            keep_single_slice,
            jobs,
        } => {
            let images = discover_images(&input)?;
            if images.is_empty() {
                return Err(CliError::Setup(format!(
                    "no image stack found in {}",
                    input.display()
                )));
            }
            info!("{} image stacks found in {}", images.len(), input.display());

            // Plain stacks carry no physical metadata, so the lateral
            // calibration must come from the operator
            let xy = xy_cal.ok_or_else(|| {
                CliError::Setup("no usable calibration, pass --xy-cal".to_string())
            })?;
            let cal = Calibration::new(xy, xy, z_cal);
            info!("XY calibration = {}, Z calibration = {}", xy, z_cal);

            let mask_dir = masks.unwrap_or_else(|| input.clone());
            if !mask_dir.is_dir() {
                return Err(CliError::Setup(format!(
                    "mask folder {} not found",
                    mask_dir.display()
                )));
            }

            std::fs::create_dir_all(&output)?;
            let report = Mutex::new(ReportWriter::create(output.join("results.tsv"))?);

            let oracle =
                MaskFileOracle::new(MaskFileOracleConfig::new(mask_dir).with_suffix(mask_suffix));

            let config = PipelineConfig {
                channels,
                nucleus_channel,
                foci_channel,
                cal,
                mode: unit.into(),
                min_nucleus_size,
                max_nucleus_size,
                drop_single_slice: !keep_single_slice,
                detector: FociDetectorConfig::new()
                    .with_sigmas(sigma1, sigma2)
                    .with_method(method.into())
                    .with_size_bounds(min_foci_size, max_foci_size),
                quantifier: QuantifierConfig::new()
                    .with_dilation(dilation, 0.0)
                    .with_mode(unit.into()),
            };

            // Images are independent; failures are logged and skipped
            let analyze = |path: &PathBuf| match process_image(
                path, &config, &oracle, &report, &output,
            ) {
                Ok(rows) => (rows, 0usize),
                Err(e) => {
                    warn!("skipping {}: {e}", path.display());
                    (0, 1)
                }
            };

            let (rows, failures) = if jobs > 1 {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
                pool.install(|| {
                    images
                        .par_iter()
                        .map(analyze)
                        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
                })
            } else {
                images
                    .iter()
                    .map(analyze)
                    .fold((0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
            };

            info!(
                "--- all done: {rows} rows from {} images ({failures} skipped) ---",
                images.len() - failures
            );
        }

        Commands::Info { input, channels } => {
            let mut reader = TiffStackReader::open(&input, channels)?;
            let (width, height) = reader.dimensions();

            println!("File: {}", input.display());
            println!("Size: {}x{} pixels", width, height);
            println!("Slices: {}", reader.depth());
            println!("Channels: {}", reader.channel_count());

            for c in 0..reader.channel_count() {
                let volume = reader.read_channel(c)?;
                let mut lo = f32::INFINITY;
                let mut hi = f32::NEG_INFINITY;
                for &v in volume.iter() {
                    lo = lo.min(v);
                    hi = hi.max(v);
                }
                println!(
                    "Channel {}: intensity range {} - {}",
                    reader.channel_name(c),
                    lo,
                    hi
                );
            }
        }
    }

    Ok(())
}
