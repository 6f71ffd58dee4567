//! puncta-algorithms: Object extraction and quantification algorithms.
//!
//! This crate provides the analysis stages of the pipeline:
//! - **Labeling** - 26-connected component extraction (union-find)
//! - **Band-pass** - separable Gaussian / difference-of-Gaussians
//! - **Thresholding** - automatic global methods (Triangle, Otsu, ...)
//! - **Detection** - the composed foci detector
//! - **Background** - median intensity outside all nuclei
//! - **Colocalization** - centroid-containment focus/nucleus pairing
//! - **Quantification** - background-corrected per-nucleus metrics
//!
#![warn(missing_docs)]

mod background;
mod bandpass;
mod colocalize;
mod detect;
mod fillholes;
mod labeling;
mod quantify;
mod threshold;

pub use background::background_median;
pub use bandpass::{difference_of_gaussians, gaussian_blur_xy};
pub use colocalize::colocalize;
pub use detect::{FociDetector, FociDetectorConfig};
pub use fillholes::fill_holes;
pub use labeling::{extract_components, extract_components_masked};
pub use quantify::{dilate, NucleusQuantifier, QuantifierConfig};
pub use threshold::{apply_threshold, auto_threshold, ThresholdMethod};

// Re-export the core types the algorithm APIs are expressed in
pub use puncta_core::{Calibration, Population, Result, SizeMode};
