//! Global background estimation outside segmented nuclei.

use log::warn;
use puncta_core::{Error, IntensityVolume, LabelVolume, Result};

/// Median intensity of the measured channel over the complement of the
/// union of all nucleus masks.
///
/// Computed from the raw segmentation labels before any population
/// filtering, so border-touching or size-rejected nuclei still do not
/// leak into the background sample. One global value per image; the
/// median is robust to residual bright structures outside nuclei.
///
/// Returns 0.0 (with a warning) when the nuclei cover the whole volume.
pub fn background_median(nuclei: &LabelVolume, channel: &IntensityVolume) -> Result<f64> {
    if nuclei.dim() != channel.dim() {
        return Err(Error::ShapeMismatch {
            expected: nuclei.dim(),
            actual: channel.dim(),
        });
    }

    let mut sample: Vec<f32> = nuclei
        .iter()
        .zip(channel.iter())
        .filter(|&(&label, _)| label == 0)
        .map(|(_, &v)| v)
        .collect();

    if sample.is_empty() {
        warn!("nucleus masks cover the whole volume, background falls back to 0");
        return Ok(0.0);
    }

    sample.sort_unstable_by(f32::total_cmp);
    let n = sample.len();
    let median = if n % 2 == 1 {
        f64::from(sample[n / 2])
    } else {
        (f64::from(sample[n / 2 - 1]) + f64::from(sample[n / 2])) / 2.0
    };
    Ok(median)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_median_outside_mask() {
        let mut nuclei: LabelVolume = Array3::zeros((1, 2, 3));
        nuclei[(0, 0, 0)] = 1;

        let mut channel: IntensityVolume = Array3::zeros((1, 2, 3));
        // Inside the nucleus: huge value that must be ignored
        channel[(0, 0, 0)] = 9999.0;
        let outside = [3.0, 1.0, 2.0, 5.0, 4.0];
        for (i, &v) in outside.iter().enumerate() {
            let idx = i + 1;
            channel[(0, idx / 3, idx % 3)] = v;
        }

        let bg = background_median(&nuclei, &channel).unwrap();
        assert_relative_eq!(bg, 3.0);
    }

    #[test]
    fn test_even_sample_averages_middles() {
        let nuclei: LabelVolume = Array3::zeros((1, 1, 4));
        let mut channel: IntensityVolume = Array3::zeros((1, 1, 4));
        for (i, v) in [1.0, 2.0, 10.0, 20.0].into_iter().enumerate() {
            channel[(0, 0, i)] = v;
        }
        let bg = background_median(&nuclei, &channel).unwrap();
        assert_relative_eq!(bg, 6.0);
    }

    #[test]
    fn test_robust_to_bright_outlier() {
        let nuclei: LabelVolume = Array3::zeros((1, 1, 5));
        let mut channel: IntensityVolume = Array3::from_elem((1, 1, 5), 10.0);
        channel[(0, 0, 4)] = 5000.0;
        let bg = background_median(&nuclei, &channel).unwrap();
        assert_relative_eq!(bg, 10.0);
    }

    #[test]
    fn test_full_coverage_falls_back_to_zero() {
        let nuclei: LabelVolume = Array3::from_elem((1, 2, 2), 1);
        let channel: IntensityVolume = Array3::from_elem((1, 2, 2), 50.0);
        let bg = background_median(&nuclei, &channel).unwrap();
        assert_relative_eq!(bg, 0.0);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let nuclei: LabelVolume = Array3::zeros((1, 2, 2));
        let channel: IntensityVolume = Array3::zeros((1, 3, 3));
        assert!(background_median(&nuclei, &channel).is_err());
    }
}
