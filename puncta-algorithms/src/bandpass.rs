//! Separable Gaussian filtering and difference-of-Gaussians band-pass.

use ndarray::Array3;
use puncta_core::IntensityVolume;

/// Builds a normalized 1D Gaussian kernel truncated at 3σ.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (3.0 * sigma).ceil().max(1.0) as usize;
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    let denom = 2.0 * sigma * sigma;
    for i in 0..=2 * radius {
        let d = i as f64 - radius as f64;
        kernel.push((-d * d / denom).exp());
    }
    let sum: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Applies a lateral (XY-only) Gaussian blur to each Z slice.
///
/// Separable: one pass along X, one along Y. Borders are handled by
/// edge replication. The axial direction is untouched so punctate
/// structures are enhanced slice by slice, matching how the channels
/// are acquired.
pub fn gaussian_blur_xy(volume: &IntensityVolume, sigma: f64) -> IntensityVolume {
    if sigma <= 0.0 {
        return volume.clone();
    }
    let (depth, height, width) = volume.dim();
    let kernel = gaussian_kernel(sigma);
    let radius = kernel.len() / 2;

    // Pass along X
    let mut tmp: IntensityVolume = Array3::zeros((depth, height, width));
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0.0f64;
                for (k, &w) in kernel.iter().enumerate() {
                    let sx = (x + k).saturating_sub(radius).min(width - 1);
                    acc += w * f64::from(volume[(z, y, sx)]);
                }
                tmp[(z, y, x)] = acc as f32;
            }
        }
    }

    // Pass along Y
    let mut out: IntensityVolume = Array3::zeros((depth, height, width));
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0.0f64;
                for (k, &w) in kernel.iter().enumerate() {
                    let sy = (y + k).saturating_sub(radius).min(height - 1);
                    acc += w * f64::from(tmp[(z, sy, x)]);
                }
                out[(z, y, x)] = acc as f32;
            }
        }
    }
    out
}

/// Difference-of-Gaussians band-pass: `blur(σ1) − blur(σ2)` with
/// `σ1 < σ2`, suppressing pixel noise and large-scale background while
/// keeping structures near the foci scale.
pub fn difference_of_gaussians(
    volume: &IntensityVolume,
    sigma1: f64,
    sigma2: f64,
) -> IntensityVolume {
    let narrow = gaussian_blur_xy(volume, sigma1);
    let wide = gaussian_blur_xy(volume, sigma2);
    narrow - wide
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_kernel_normalized_and_symmetric() {
        let k = gaussian_kernel(1.5);
        let sum: f64 = k.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        assert_relative_eq!(k[0], k[k.len() - 1]);
        let mid = k.len() / 2;
        assert!(k[mid] > k[mid - 1]);
    }

    #[test]
    fn test_blur_preserves_flat_volume() {
        let volume: IntensityVolume = Array3::from_elem((2, 8, 8), 7.0);
        let out = gaussian_blur_xy(&volume, 2.0);
        for &v in out.iter() {
            assert_relative_eq!(v, 7.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_blur_spreads_impulse() {
        let mut volume: IntensityVolume = Array3::zeros((1, 9, 9));
        volume[(0, 4, 4)] = 100.0;
        let out = gaussian_blur_xy(&volume, 1.0);

        assert!(out[(0, 4, 4)] < 100.0);
        assert!(out[(0, 4, 3)] > 0.0);
        assert!(out[(0, 3, 4)] > 0.0);
        // Mass is conserved away from borders
        let total: f32 = out.iter().sum();
        assert_relative_eq!(total, 100.0, epsilon = 0.1);
    }

    #[test]
    fn test_blur_does_not_cross_slices() {
        let mut volume: IntensityVolume = Array3::zeros((2, 9, 9));
        volume[(0, 4, 4)] = 100.0;
        let out = gaussian_blur_xy(&volume, 1.0);
        for y in 0..9 {
            for x in 0..9 {
                assert_relative_eq!(out[(1, y, x)], 0.0);
            }
        }
    }

    #[test]
    fn test_dog_removes_uniform_background() {
        let volume: IntensityVolume = Array3::from_elem((1, 16, 16), 50.0);
        let out = difference_of_gaussians(&volume, 1.0, 3.0);
        for &v in out.iter() {
            assert_relative_eq!(v, 0.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_dog_keeps_puncta_positive() {
        let mut volume: IntensityVolume = Array3::from_elem((1, 21, 21), 10.0);
        volume[(0, 10, 10)] = 200.0;
        let out = difference_of_gaussians(&volume, 1.0, 3.0);
        assert!(out[(0, 10, 10)] > 0.0);
    }
}
