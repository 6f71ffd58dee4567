//! Per-image analysis pipeline.

use log::{info, warn};
use ndarray::Array3;
use puncta_algorithms::{
    background_median, colocalize, extract_components, FociDetector, FociDetectorConfig,
    NucleusQuantifier, QuantifierConfig,
};
use puncta_core::{Calibration, LabelVolume, Population, ResultsRow, SizeMode};
use puncta_io::{
    ChannelReader, ReportWriter, SegmentationOracle, TiffStackReader, VisualizationWriter,
};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Pipeline error types.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image could not be read or decoded.
    #[error("image read failed: {0}")]
    ImageRead(#[from] puncta_io::Error),

    /// Core measurement error.
    #[error("measurement failed: {0}")]
    Measurement(#[from] puncta_core::Error),

    /// Report row could not be written.
    #[error("report write failed: {0}")]
    Report(std::io::Error),
}

/// Settings shared by every image of one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Channels interleaved in each stack.
    pub channels: usize,
    /// Channel index holding the nucleus stain.
    pub nucleus_channel: usize,
    /// Channel index holding the foci stain.
    pub foci_channel: usize,
    /// Physical calibration of the run.
    pub cal: Calibration,
    /// Measurement mode (area or volume).
    pub mode: SizeMode,
    /// Minimum physical nucleus size.
    pub min_nucleus_size: f64,
    /// Maximum physical nucleus size.
    pub max_nucleus_size: f64,
    /// Drop nuclei confined to one Z slice (only applied to real stacks).
    pub drop_single_slice: bool,
    /// Foci detector settings.
    pub detector: FociDetectorConfig,
    /// Quantifier settings.
    pub quantifier: QuantifierConfig,
}

/// Runs the full analysis on one image stack and appends its rows.
///
/// Returns the number of rows written. A segmentation failure is
/// recovered inside the call: the image contributes zero rows and the
/// run continues.
pub fn process_image(
    path: &Path,
    config: &PipelineConfig,
    oracle: &dyn SegmentationOracle,
    report: &Mutex<ReportWriter>,
    out_dir: &Path,
) -> Result<usize, PipelineError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    info!("--- analyzing {stem} ---");

    let mut reader = TiffStackReader::open(path, config.channels)?;
    let raw_nucleus = reader.read_channel(config.nucleus_channel)?;
    let raw_foci = reader.read_channel(config.foci_channel)?;
    let (depth, height, width) = raw_nucleus.dim();

    // Nucleus segmentation by the external oracle; an oracle failure
    // degrades to zero nuclei rather than aborting the run
    let labels: LabelVolume = match oracle.segment(&raw_nucleus, &stem) {
        Ok(labels) => labels,
        Err(e) => {
            warn!("{stem}: segmentation oracle failed ({e}), image contributes no rows");
            Array3::zeros((depth, height, width))
        }
    };

    // Background from the raw mask, before any population filtering
    let background = background_median(&labels, &raw_foci)?;
    info!("{stem}: background intensity {background:.2}");

    let mut nuclei = extract_components(&labels)?;
    info!("{stem}: {} nuclei detected", nuclei.len());
    nuclei = nuclei.exclude_xy_borders(width, height);
    if config.drop_single_slice && depth > 1 {
        nuclei = nuclei.retain_multi_slice();
    }
    nuclei = nuclei.filter_size(
        config.min_nucleus_size,
        config.max_nucleus_size,
        config.cal,
        config.mode,
    );
    info!("{stem}: {} nuclei remaining after filtering", nuclei.len());

    let detector = FociDetector::with_config(config.detector.clone());
    let foci = detector.detect(&raw_foci, config.cal, config.mode)?;

    let records = colocalize(&nuclei, &foci);

    let quantifier = NucleusQuantifier::with_config(config.quantifier);
    let metrics = quantifier.quantify_all(&records, &raw_foci, background, config.cal)?;

    let mut rows = 0usize;
    {
        let mut report = report.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for m in &metrics {
            report
                .write_row(&ResultsRow::new(stem.clone(), background, *m))
                .map_err(to_report_error)?;
            rows += 1;
        }
    }

    // Annotated composite: kept nuclei and the foci that matched one
    let matched: Population = records
        .iter()
        .flat_map(|r| r.foci.iter().cloned())
        .collect();
    let composite = out_dir.join(format!("{stem}_objects.tif"));
    VisualizationWriter::new().write(&composite, &nuclei, &matched, &raw_nucleus, &raw_foci)?;

    info!("{stem}: {rows} rows written");
    Ok(rows)
}

fn to_report_error(e: puncta_io::Error) -> PipelineError {
    match e {
        puncta_io::Error::Io(io) => PipelineError::Report(io),
        other => PipelineError::ImageRead(other),
    }
}
