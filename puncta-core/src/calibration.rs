//! Physical voxel calibration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical voxel size in microns, with derived area/volume factors.
///
/// Set once per run from acquisition metadata (optionally overridden by
/// the operator) and passed by value into every measurement stage.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Calibration {
    /// Lateral pixel width (µm).
    pub pixel_width: f64,
    /// Lateral pixel height (µm).
    pub pixel_height: f64,
    /// Axial slice spacing (µm).
    pub pixel_depth: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixel_width: 1.0,
            pixel_height: 1.0,
            pixel_depth: 1.0,
        }
    }
}

impl Calibration {
    /// Creates a calibration from explicit lateral and axial sizes.
    pub fn new(pixel_width: f64, pixel_height: f64, pixel_depth: f64) -> Self {
        Self {
            pixel_width,
            pixel_height,
            pixel_depth,
        }
    }

    /// Creates an isotropic calibration.
    pub fn isotropic(size: f64) -> Self {
        Self::new(size, size, size)
    }

    /// Sets the lateral pixel size (width and height).
    #[must_use]
    pub fn with_xy(mut self, size: f64) -> Self {
        self.pixel_width = size;
        self.pixel_height = size;
        self
    }

    /// Sets the axial slice spacing.
    #[must_use]
    pub fn with_depth(mut self, size: f64) -> Self {
        self.pixel_depth = size;
        self
    }

    /// Physical area of one pixel (µm²).
    #[inline]
    pub fn pixel_area(&self) -> f64 {
        self.pixel_width * self.pixel_height
    }

    /// Physical volume of one voxel (µm³).
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.pixel_width * self.pixel_height * self.pixel_depth
    }

    /// Physical size of one voxel under the given measurement mode.
    #[inline]
    pub fn unit_size(&self, mode: SizeMode) -> f64 {
        match mode {
            SizeMode::Area => self.pixel_area(),
            SizeMode::Volume => self.voxel_volume(),
        }
    }
}

/// Measurement mode used consistently throughout one run.
///
/// `Area` reports sizes in µm² (flattened 2D conventions, axial spacing
/// ignored); `Volume` reports sizes in µm³.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SizeMode {
    /// Sizes are physical areas (µm²).
    #[default]
    Area,
    /// Sizes are physical volumes (µm³).
    Volume,
}
