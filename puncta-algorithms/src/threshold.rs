//! Automatic global thresholding methods.

use ndarray::Array3;
use puncta_core::{IntensityVolume, MaskVolume};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const BINS: usize = 256;

/// Automatic global thresholding method.
///
/// All methods operate on a 256-bin histogram stretched over the
/// volume's intensity range and return a threshold in intensity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThresholdMethod {
    /// Triangle method: maximizes the distance between the histogram
    /// and the line joining its peak to the far end of its longer tail.
    /// Suited to strongly skewed histograms such as sparse foci images.
    #[default]
    Triangle,
    /// Otsu's method: maximizes between-class variance.
    Otsu,
    /// Mean intensity of the volume.
    Mean,
    /// IsoData (iterative intermeans).
    IsoData,
}

impl std::fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThresholdMethod::Triangle => write!(f, "Triangle"),
            ThresholdMethod::Otsu => write!(f, "Otsu"),
            ThresholdMethod::Mean => write!(f, "Mean"),
            ThresholdMethod::IsoData => write!(f, "IsoData"),
        }
    }
}

/// Computes the automatic threshold of a volume with the given method.
///
/// Returns the threshold in intensity units; voxels strictly above it
/// are foreground. A flat volume thresholds to its single value, so
/// the resulting mask is empty.
pub fn auto_threshold(volume: &IntensityVolume, method: ThresholdMethod) -> f64 {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in volume.iter() {
        let v = f64::from(v);
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || hi <= lo {
        return lo.max(0.0);
    }

    let bin_width = (hi - lo) / BINS as f64;
    let mut histogram = [0u64; BINS];
    for &v in volume.iter() {
        let bin = (((f64::from(v) - lo) / bin_width) as usize).min(BINS - 1);
        histogram[bin] += 1;
    }

    let bin = match method {
        ThresholdMethod::Triangle => triangle_bin(&histogram),
        ThresholdMethod::Otsu => otsu_bin(&histogram),
        ThresholdMethod::Mean => mean_bin(&histogram),
        ThresholdMethod::IsoData => isodata_bin(&histogram),
    };
    lo + (bin as f64 + 0.5) * bin_width
}

/// Binarizes a volume against a threshold: strictly-above is foreground.
pub fn apply_threshold(volume: &IntensityVolume, threshold: f64) -> MaskVolume {
    let mut mask: MaskVolume = Array3::zeros(volume.dim());
    for (out, &v) in mask.iter_mut().zip(volume.iter()) {
        if f64::from(v) > threshold {
            *out = 1;
        }
    }
    mask
}

fn triangle_bin(histogram: &[u64; BINS]) -> usize {
    let peak = histogram
        .iter()
        .enumerate()
        .max_by_key(|&(_, &c)| c)
        .map_or(0, |(i, _)| i);
    let first = histogram.iter().position(|&c| c > 0).unwrap_or(0);
    let last = histogram.iter().rposition(|&c| c > 0).unwrap_or(BINS - 1);

    // Walk the longer tail from the peak
    let (from, to) = if peak.saturating_sub(first) > last.saturating_sub(peak) {
        (first, peak)
    } else {
        (peak, last)
    };
    if from == to {
        return peak;
    }

    let peak_count = histogram[peak] as f64;
    let tail_end = if from == peak { to } else { from };
    let span = (tail_end as f64 - peak as f64).abs();

    // Distance of each bin to the peak->tail line, maximized
    let mut best = peak;
    let mut best_dist = f64::NEG_INFINITY;
    let lo = from.min(to);
    let hi = from.max(to);
    for b in lo..=hi {
        let t = (b as f64 - peak as f64).abs() / span;
        let line = peak_count * (1.0 - t);
        let dist = line - histogram[b] as f64;
        if dist > best_dist {
            best_dist = dist;
            best = b;
        }
    }
    best
}

fn otsu_bin(histogram: &[u64; BINS]) -> usize {
    let total: u64 = histogram.iter().sum();
    let total_f = total as f64;
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut best = 0;
    let mut best_variance = f64::NEG_INFINITY;
    let mut background_count = 0.0;
    let mut background_sum = 0.0;

    for (i, &c) in histogram.iter().enumerate() {
        background_count += c as f64;
        background_sum += i as f64 * c as f64;
        let foreground_count = total_f - background_count;
        if background_count == 0.0 || foreground_count == 0.0 {
            continue;
        }
        let mean_bg = background_sum / background_count;
        let mean_fg = (weighted_sum - background_sum) / foreground_count;
        let variance =
            background_count * foreground_count * (mean_bg - mean_fg) * (mean_bg - mean_fg);
        if variance > best_variance {
            best_variance = variance;
            best = i;
        }
    }
    best
}

fn mean_bin(histogram: &[u64; BINS]) -> usize {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }
    let weighted_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();
    (weighted_sum / total as f64).floor() as usize
}

fn isodata_bin(histogram: &[u64; BINS]) -> usize {
    let mut t = mean_bin(histogram);
    loop {
        let (mut count_lo, mut sum_lo) = (0.0f64, 0.0f64);
        let (mut count_hi, mut sum_hi) = (0.0f64, 0.0f64);
        for (i, &c) in histogram.iter().enumerate() {
            if i <= t {
                count_lo += c as f64;
                sum_lo += i as f64 * c as f64;
            } else {
                count_hi += c as f64;
                sum_hi += i as f64 * c as f64;
            }
        }
        if count_lo == 0.0 || count_hi == 0.0 {
            return t;
        }
        let next = ((sum_lo / count_lo + sum_hi / count_hi) / 2.0).round() as usize;
        if next == t {
            return t;
        }
        t = next;
    }
}
