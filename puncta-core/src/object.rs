//! Labeled 3D connected components.

use crate::calibration::{Calibration, SizeMode};
use crate::error::{Error, Result};
use crate::volume::IntensityVolume;
use crate::voxel::{BoundingBox, Voxel};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single labeled 3D object: a set of voxels with a bounding box and
/// a label unique within its population.
///
/// Immutable once built by a labeling pass. Derived objects (unions,
/// dilations) are new values; the voxel set is never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Object3D {
    label: u32,
    /// Sorted ascending in `(z, y, x)` raster order.
    voxels: Vec<Voxel>,
    bbox: BoundingBox,
}

impl Object3D {
    /// Builds an object from its voxel membership.
    ///
    /// Voxels are sorted into raster order and deduplicated; the
    /// bounding box is derived. Fails on an empty voxel set.
    pub fn new(label: u32, mut voxels: Vec<Voxel>) -> Result<Self> {
        if voxels.is_empty() {
            return Err(Error::EmptyObject);
        }
        voxels.sort_unstable();
        voxels.dedup();

        let mut bbox = BoundingBox::of(voxels[0]);
        for v in &voxels[1..] {
            bbox.include(*v);
        }
        Ok(Self {
            label,
            voxels,
            bbox,
        })
    }

    /// Builds the union of several objects' voxel sets under one label.
    pub fn union<'a, I>(label: u32, objects: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Object3D>,
    {
        let voxels: Vec<Voxel> = objects
            .into_iter()
            .flat_map(|o| o.voxels.iter().copied())
            .collect();
        Self::new(label, voxels)
    }

    /// Returns the same object under a different label.
    #[must_use]
    pub fn with_label(mut self, label: u32) -> Self {
        self.label = label;
        self
    }

    /// The object's label.
    #[inline]
    pub fn label(&self) -> u32 {
        self.label
    }

    /// The object's voxels, sorted in raster order.
    #[inline]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Number of voxels in the object.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    /// The object's inclusive bounding box.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Geometric centroid as `(x, y, z)` in voxel units.
    pub fn centroid(&self) -> (f64, f64, f64) {
        let n = self.voxels.len() as f64;
        let (mut sx, mut sy, mut sz) = (0.0, 0.0, 0.0);
        for v in &self.voxels {
            sx += f64::from(v.x);
            sy += f64::from(v.y);
            sz += f64::from(v.z);
        }
        (sx / n, sy / n, sz / n)
    }

    /// Centroid rounded to the nearest voxel coordinate.
    pub fn centroid_voxel(&self) -> Voxel {
        let (x, y, z) = self.centroid();
        Voxel::new(x.round() as u32, y.round() as u32, z.round() as u32)
    }

    /// True if the given voxel belongs to the object.
    pub fn contains(&self, v: Voxel) -> bool {
        self.voxels.binary_search(&v).is_ok()
    }

    /// Physical size under the run's measurement mode.
    pub fn physical_size(&self, cal: Calibration, mode: SizeMode) -> f64 {
        self.voxels.len() as f64 * cal.unit_size(mode)
    }

    /// Sum of raw channel intensities over the object's voxels.
    ///
    /// The channel volume must cover every voxel of the object.
    pub fn intensity_sum(&self, channel: &IntensityVolume) -> f64 {
        self.voxels
            .iter()
            .map(|v| f64::from(channel[v.index()]))
            .sum()
    }

    /// Mean raw channel intensity over the object's voxels.
    pub fn intensity_mean(&self, channel: &IntensityVolume) -> f64 {
        self.intensity_sum(channel) / self.voxels.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn blob() -> Object3D {
        Object3D::new(
            1,
            vec![
                Voxel::new(1, 1, 0),
                Voxel::new(2, 1, 0),
                Voxel::new(1, 2, 0),
                Voxel::new(2, 2, 0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_object_rejected() {
        assert!(Object3D::new(1, Vec::new()).is_err());
    }

    #[test]
    fn test_centroid_and_rounding() {
        let obj = blob();
        let (x, y, z) = obj.centroid();
        assert_relative_eq!(x, 1.5);
        assert_relative_eq!(y, 1.5);
        assert_relative_eq!(z, 0.0);
        // 1.5 rounds away from zero
        assert_eq!(obj.centroid_voxel(), Voxel::new(2, 2, 0));
    }

    #[test]
    fn test_contains() {
        let obj = blob();
        assert!(obj.contains(Voxel::new(1, 2, 0)));
        assert!(!obj.contains(Voxel::new(3, 2, 0)));
        assert!(!obj.contains(Voxel::new(1, 2, 1)));
    }

    #[test]
    fn test_union_dedups() {
        let a = blob();
        let b = Object3D::new(2, vec![Voxel::new(2, 2, 0), Voxel::new(3, 2, 0)]).unwrap();
        let u = Object3D::union(9, [&a, &b]).unwrap();
        assert_eq!(u.label(), 9);
        assert_eq!(u.voxel_count(), 5);
    }

    #[test]
    fn test_physical_size() {
        let obj = blob();
        let cal = Calibration::new(0.5, 0.5, 2.0);
        assert_relative_eq!(obj.physical_size(cal, SizeMode::Area), 1.0);
        assert_relative_eq!(obj.physical_size(cal, SizeMode::Volume), 2.0);
    }

    #[test]
    fn test_intensity_measures() {
        let mut channel: IntensityVolume = Array3::zeros((1, 4, 4));
        for v in blob().voxels() {
            channel[v.index()] = 10.0;
        }
        channel[(0, 1, 1)] = 30.0;

        let obj = blob();
        assert_relative_eq!(obj.intensity_sum(&channel), 60.0);
        assert_relative_eq!(obj.intensity_mean(&channel), 15.0);
    }
}
