//! Per-nucleus records and result rows.

use crate::object::Object3D;
use crate::population::Population;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One nucleus paired with the foci whose centroids it contains.
///
/// Produced once per nucleus by colocalization and consumed exactly
/// once by quantification. A nucleus with no contained foci is a valid
/// record and still yields a results row with zero counts.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NucleusRecord {
    /// The nucleus object.
    pub nucleus: Object3D,
    /// Foci assigned to this nucleus, labels reset within the record.
    pub foci: Population,
}

impl NucleusRecord {
    /// Creates a record from a nucleus and its matched foci.
    pub fn new(nucleus: Object3D, foci: Population) -> Self {
        Self { nucleus, foci }
    }
}

/// Quantified per-nucleus measurements.
///
/// Areas are in the run's physical unit (µm² or µm³ depending on the
/// measurement mode); intensities are background-corrected, with the
/// correction applied exactly once per derived quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NucleusMetrics {
    /// Nucleus label at quantification time.
    pub nucleus_id: u32,
    /// Physical size of the nucleus.
    pub nucleus_area: f64,
    /// Number of foci assigned to the nucleus.
    pub foci_count: usize,
    /// Physical size of the union of all foci masks.
    pub foci_area: f64,
    /// Background-corrected mean intensity over the foci mask.
    pub foci_mean_intensity: f64,
    /// Background-corrected integrated intensity over the foci mask.
    pub foci_total_intensity: f64,
    /// Nucleus size minus the summed sizes of the dilated foci.
    pub diffuse_area: f64,
    /// Background-corrected mean intensity of the diffuse signal.
    /// NaN when no nucleus voxels remain after dilation masking.
    pub diffuse_mean_intensity: f64,
    /// Background-corrected integrated intensity of the diffuse signal.
    pub diffuse_total_intensity: f64,
}

impl NucleusMetrics {
    /// Metrics for a nucleus with no assigned foci: the whole nucleus
    /// is diffuse signal.
    pub fn without_foci(
        nucleus_id: u32,
        nucleus_area: f64,
        diffuse_mean_intensity: f64,
        diffuse_total_intensity: f64,
    ) -> Self {
        Self {
            nucleus_id,
            nucleus_area,
            foci_count: 0,
            foci_area: 0.0,
            foci_mean_intensity: 0.0,
            foci_total_intensity: 0.0,
            diffuse_area: nucleus_area,
            diffuse_mean_intensity,
            diffuse_total_intensity,
        }
    }
}

/// One report row: a quantified nucleus within one image.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultsRow {
    /// Source image name (without extension).
    pub image_name: String,
    /// Global background intensity for the image.
    pub background: f64,
    /// The per-nucleus measurements.
    pub metrics: NucleusMetrics,
}

impl ResultsRow {
    /// Creates a row from the image context and nucleus metrics.
    pub fn new(image_name: impl Into<String>, background: f64, metrics: NucleusMetrics) -> Self {
        Self {
            image_name: image_name.into(),
            background,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::Voxel;
    use approx::assert_relative_eq;

    #[test]
    fn test_record_with_empty_foci_is_valid() {
        let nucleus = Object3D::new(1, vec![Voxel::new(1, 1, 0)]).unwrap();
        let record = NucleusRecord::new(nucleus, Population::new());
        assert!(record.foci.is_empty());
    }

    #[test]
    fn test_metrics_without_foci() {
        let m = NucleusMetrics::without_foci(3, 42.0, 1.5, 63.0);
        assert_eq!(m.foci_count, 0);
        assert_relative_eq!(m.foci_area, 0.0);
        assert_relative_eq!(m.diffuse_area, m.nucleus_area);
        assert_relative_eq!(m.diffuse_total_intensity, 63.0);
    }
}
