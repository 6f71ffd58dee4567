//! Segmentation oracle seam and the mask-file oracle.

use crate::error::{Error, Result};
use crate::reader::read_label_stack;
use log::debug;
use puncta_core::{rescale_labels_nearest, IntensityVolume, LabelVolume};
use std::path::PathBuf;

/// External instance-segmentation collaborator.
///
/// Given an intensity volume, returns a labeled volume of the same
/// extent where each positive value marks one instance. The oracle may
/// internally work on a downscaled copy; implementations must hand
/// back labels at the input resolution.
pub trait SegmentationOracle {
    /// Identifier of the segmentation model/backend, for logs.
    fn name(&self) -> &'static str;

    /// Segments one volume into instance labels.
    fn segment(&self, channel: &IntensityVolume, image_stem: &str) -> Result<LabelVolume>;
}

/// Configuration for [`MaskFileOracle`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaskFileOracleConfig {
    /// Folder holding the pre-computed label masks.
    pub mask_dir: PathBuf,
    /// Suffix appended to the image stem to form the mask file name.
    pub suffix: String,
}

impl MaskFileOracleConfig {
    /// Creates a configuration for masks named `<stem><suffix>.tif`.
    pub fn new(mask_dir: impl Into<PathBuf>) -> Self {
        Self {
            mask_dir: mask_dir.into(),
            suffix: "_nuclei".to_string(),
        }
    }

    /// Sets the mask file suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

/// Oracle backed by pre-computed label mask files.
///
/// Looks up `<mask_dir>/<stem><suffix>.tif` next to each analyzed
/// image. Masks produced on a laterally downscaled copy are rescaled
/// to the channel's resolution by nearest-neighbor; the slice count
/// must match exactly.
pub struct MaskFileOracle {
    config: MaskFileOracleConfig,
}

impl MaskFileOracle {
    /// Creates an oracle over the given mask folder.
    pub fn new(config: MaskFileOracleConfig) -> Self {
        Self { config }
    }

    fn mask_path(&self, image_stem: &str) -> PathBuf {
        self.config
            .mask_dir
            .join(format!("{image_stem}{}.tif", self.config.suffix))
    }
}

impl SegmentationOracle for MaskFileOracle {
    fn name(&self) -> &'static str {
        "mask-file"
    }

    fn segment(&self, channel: &IntensityVolume, image_stem: &str) -> Result<LabelVolume> {
        let path = self.mask_path(image_stem);
        if !path.is_file() {
            return Err(Error::MissingMask(path));
        }

        let labels = read_label_stack(&path)?;
        let (depth, height, width) = channel.dim();
        let (mask_depth, mask_height, mask_width) = labels.dim();

        if mask_depth != depth {
            return Err(Error::Segmentation(format!(
                "mask {} has {mask_depth} slices, image has {depth}",
                path.display()
            )));
        }
        if (mask_height, mask_width) == (height, width) {
            return Ok(labels);
        }

        debug!(
            "rescaling mask {} from {mask_width}x{mask_height} to {width}x{height}",
            path.display()
        );
        Ok(rescale_labels_nearest(&labels, height, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use std::fs::File;
    use std::io::BufWriter;
    use tempfile::TempDir;
    use tiff::encoder::{colortype, TiffEncoder};

    fn write_mask(path: &std::path::Path, data: &[u16], width: u32, height: u32) {
        let file = BufWriter::new(File::create(path).unwrap());
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<colortype::Gray16>(width, height, data)
            .unwrap();
    }

    #[test]
    fn test_reads_matching_mask() {
        let dir = TempDir::new().unwrap();
        write_mask(&dir.path().join("img_nuclei.tif"), &[0, 1, 1, 2], 2, 2);

        let oracle = MaskFileOracle::new(MaskFileOracleConfig::new(dir.path()));
        let channel: IntensityVolume = Array3::zeros((1, 2, 2));
        let labels = oracle.segment(&channel, "img").unwrap();
        assert_eq!(labels[(0, 0, 1)], 1);
        assert_eq!(labels[(0, 1, 1)], 2);
    }

    #[test]
    fn test_missing_mask_is_reported() {
        let dir = TempDir::new().unwrap();
        let oracle = MaskFileOracle::new(MaskFileOracleConfig::new(dir.path()));
        let channel: IntensityVolume = Array3::zeros((1, 2, 2));
        assert!(matches!(
            oracle.segment(&channel, "absent"),
            Err(Error::MissingMask(_))
        ));
    }

    #[test]
    fn test_downscaled_mask_is_rescaled() {
        let dir = TempDir::new().unwrap();
        write_mask(&dir.path().join("img_nuclei.tif"), &[1, 0, 0, 2], 2, 2);

        let oracle = MaskFileOracle::new(MaskFileOracleConfig::new(dir.path()));
        let channel: IntensityVolume = Array3::zeros((1, 4, 4));
        let labels = oracle.segment(&channel, "img").unwrap();
        assert_eq!(labels.dim(), (1, 4, 4));
        assert_eq!(labels[(0, 0, 0)], 1);
        assert_eq!(labels[(0, 1, 1)], 1);
        assert_eq!(labels[(0, 3, 3)], 2);
    }

    #[test]
    fn test_slice_count_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        write_mask(&dir.path().join("img_nuclei.tif"), &[1, 0, 0, 2], 2, 2);

        let oracle = MaskFileOracle::new(MaskFileOracleConfig::new(dir.path()));
        let channel: IntensityVolume = Array3::zeros((3, 2, 2));
        assert!(matches!(
            oracle.segment(&channel, "img"),
            Err(Error::Segmentation(_))
        ));
    }

    #[test]
    fn test_custom_suffix() {
        let dir = TempDir::new().unwrap();
        write_mask(&dir.path().join("img_cp_masks.tif"), &[1, 1, 1, 1], 2, 2);

        let config = MaskFileOracleConfig::new(dir.path()).with_suffix("_cp_masks");
        let oracle = MaskFileOracle::new(config);
        let channel: IntensityVolume = Array3::zeros((1, 2, 2));
        assert!(oracle.segment(&channel, "img").is_ok());
    }
}
