//! Annotated composite visualization.

use crate::error::{Error, Result};
use puncta_core::{IntensityVolume, Population};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tiff::encoder::{colortype, TiffEncoder};

/// Fraction of pixels saturated at each end of the contrast stretch.
const SATURATION: f64 = 0.0035;

/// 3x5 bitmap glyphs for digits 0-9, one row per entry, low 3 bits used.
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b001, 0b001, 0b001], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

/// Deterministic categorical color for a label, black for background.
///
/// Hues advance by the golden angle so neighboring labels stay
/// visually distinct on dark background.
pub fn label_color(label: u32) -> [u8; 3] {
    if label == 0 {
        return [0, 0, 0];
    }
    let hue = (f64::from(label - 1) * 137.508) % 360.0;
    hsv_to_rgb(hue, 0.85, 1.0)
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> [u8; 3] {
    let c = value * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

/// Writes the per-image composite: pseudo-colored nucleus labels with
/// ID stamps, the foci mask, and the contrast-stretched raw channels.
///
/// Pages are channel-major: all Z slices of the nucleus label channel
/// (RGB), then the foci mask, then the raw nucleus and foci channels
/// (both 8-bit with a percentile contrast stretch).
#[derive(Debug, Clone, Copy, Default)]
pub struct VisualizationWriter;

impl VisualizationWriter {
    /// Creates a visualization writer.
    pub fn new() -> Self {
        Self
    }

    /// Writes one composite file.
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        nuclei: &Population,
        foci: &Population,
        raw_nucleus: &IntensityVolume,
        raw_foci: &IntensityVolume,
    ) -> Result<()> {
        let dim = raw_nucleus.dim();
        if raw_foci.dim() != dim {
            return Err(Error::InvalidStack(format!(
                "channel dimensions differ: {dim:?} vs {:?}",
                raw_foci.dim()
            )));
        }
        let (depth, height, width) = dim;

        let file = BufWriter::new(File::create(path.as_ref())?);
        let mut encoder = TiffEncoder::new(file)?;

        // Channel 1: nucleus labels, pseudo-colored, with ID stamps
        let mut label_pages = vec![vec![0u8; height * width * 3]; depth];
        for nucleus in nuclei.iter() {
            let color = label_color(nucleus.label());
            for v in nucleus.voxels() {
                let (z, y, x) = v.index();
                let at = (y * width + x) * 3;
                label_pages[z][at..at + 3].copy_from_slice(&color);
            }
            let bb = nucleus.bounding_box();
            let z = ((bb.zmin + bb.zmax) / 2) as usize;
            stamp_number(
                &mut label_pages[z],
                width,
                height,
                bb.xmin as usize,
                bb.ymin as usize,
                nucleus.label(),
            );
        }
        for page in &label_pages {
            encoder.write_image::<colortype::RGB8>(width as u32, height as u32, page)?;
        }

        // Channel 2: foci mask
        let mut foci_pages = vec![vec![0u8; height * width]; depth];
        for focus in foci.iter() {
            for v in focus.voxels() {
                let (z, y, x) = v.index();
                foci_pages[z][y * width + x] = 255;
            }
        }
        for page in &foci_pages {
            encoder.write_image::<colortype::Gray8>(width as u32, height as u32, page)?;
        }

        // Channels 3 and 4: contrast-stretched raw data
        for channel in [raw_nucleus, raw_foci] {
            let pages = stretch_to_u8(channel);
            for page in &pages {
                encoder.write_image::<colortype::Gray8>(width as u32, height as u32, page)?;
            }
        }
        Ok(())
    }
}

/// Maps a volume to 8-bit pages with a percentile contrast stretch.
fn stretch_to_u8(volume: &IntensityVolume) -> Vec<Vec<u8>> {
    let (depth, height, width) = volume.dim();
    let mut sorted: Vec<f32> = volume.iter().copied().collect();
    sorted.sort_unstable_by(f32::total_cmp);

    let n = sorted.len();
    let cut = ((n as f64 * SATURATION) as usize).min(n.saturating_sub(1));
    let lo = f64::from(sorted[cut]);
    let hi = f64::from(sorted[n - 1 - cut]);
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut pages = vec![vec![0u8; height * width]; depth];
    for ((z, y, x), &v) in volume.indexed_iter() {
        let scaled = ((f64::from(v) - lo) / span * 255.0).clamp(0.0, 255.0);
        pages[z][y * width + x] = scaled.round() as u8;
    }
    pages
}

/// Stamps a decimal number with the 3x5 glyphs, white, at `(x0, y0)`.
fn stamp_number(page: &mut [u8], width: usize, height: usize, x0: usize, y0: usize, number: u32) {
    let digits: Vec<usize> = number
        .to_string()
        .bytes()
        .map(|b| (b - b'0') as usize)
        .collect();

    for (i, &d) in digits.iter().enumerate() {
        let glyph = DIGIT_GLYPHS[d];
        let gx = x0 + i * 4;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let x = gx + col;
                let y = y0 + row;
                if x < width && y < height {
                    let at = (y * width + x) * 3;
                    page[at..at + 3].copy_from_slice(&[255, 255, 255]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use puncta_core::{Object3D, Voxel};
    use tempfile::TempDir;

    fn tiny_population() -> Population {
        Population::from_objects(vec![Object3D::new(
            1,
            vec![Voxel::new(4, 4, 0), Voxel::new(5, 4, 0)],
        )
        .unwrap()])
    }

    #[test]
    fn test_label_colors_distinct_and_stable() {
        assert_eq!(label_color(0), [0, 0, 0]);
        let c1 = label_color(1);
        let c2 = label_color(2);
        assert_ne!(c1, c2);
        assert_eq!(c1, label_color(1));
        assert_ne!(c1, [0, 0, 0]);
    }

    #[test]
    fn test_composite_page_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("composite.tif");
        let raw: IntensityVolume = Array3::from_elem((2, 10, 10), 7.0);

        VisualizationWriter::new()
            .write(&path, &tiny_population(), &Population::new(), &raw, &raw)
            .unwrap();

        let mut decoder =
            tiff::decoder::Decoder::new(std::io::BufReader::new(File::open(&path).unwrap()))
                .unwrap();
        let mut pages = 1;
        while decoder.more_images() {
            decoder.next_image().unwrap();
            pages += 1;
        }
        // 4 channels x 2 slices
        assert_eq!(pages, 8);
    }

    #[test]
    fn test_mismatched_channels_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("composite.tif");
        let a: IntensityVolume = Array3::zeros((1, 4, 4));
        let b: IntensityVolume = Array3::zeros((1, 5, 5));
        let result = VisualizationWriter::new().write(
            &path,
            &Population::new(),
            &Population::new(),
            &a,
            &b,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_stretch_maps_extremes() {
        let mut volume: IntensityVolume = Array3::zeros((1, 16, 16));
        for ((_, y, x), v) in volume.indexed_iter_mut() {
            *v = (y * 16 + x) as f32;
        }
        let pages = stretch_to_u8(&volume);
        assert_eq!(pages[0][0], 0);
        assert_eq!(pages[0][255], 255);
    }

    #[test]
    fn test_stamp_clips_at_border() {
        let mut page = vec![0u8; 8 * 8 * 3];
        // Number wider than the page; must not panic
        stamp_number(&mut page, 8, 8, 6, 6, 123);
        assert!(page.iter().any(|&b| b == 255));
    }
}
