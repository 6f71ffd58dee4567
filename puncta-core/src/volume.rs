//! Volume type aliases and label-volume helpers.

use ndarray::Array3;

/// Raw intensity channel, axis order `(z, y, x)`.
pub type IntensityVolume = Array3<f32>;

/// Instance-labeled volume: 0 is background, each positive value one object.
pub type LabelVolume = Array3<u32>;

/// Binary mask volume: 0 is background, nonzero is foreground.
pub type MaskVolume = Array3<u8>;

/// Rescales a labeled volume laterally to `(height, width)` by
/// nearest-neighbor lookup, slice by slice.
///
/// Used to bring labels produced on a downscaled copy back to the
/// original resolution before object extraction. Nearest-neighbor is
/// required: interpolating label values would invent labels.
pub fn rescale_labels_nearest(labels: &LabelVolume, height: usize, width: usize) -> LabelVolume {
    let (depth, src_h, src_w) = labels.dim();
    let mut out = Array3::zeros((depth, height, width));

    for z in 0..depth {
        for y in 0..height {
            let sy = (y * src_h) / height;
            for x in 0..width {
                let sx = (x * src_w) / width;
                out[(z, y, x)] = labels[(z, sy, sx)];
            }
        }
    }
    out
}
