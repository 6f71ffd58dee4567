//! Ordered, label-unique collections of 3D objects.

use crate::calibration::{Calibration, SizeMode};
use crate::object::Object3D;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered collection of labeled 3D objects extracted from one volume.
///
/// Labels are unique within a population. Every filtering operation
/// consumes the population and returns a new one with labels densely
/// re-assigned from 1, so label identity is only meaningful between two
/// consecutive filtering steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Population {
    objects: Vec<Object3D>,
}

impl Population {
    /// Creates an empty population.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Builds a population from objects, re-assigning dense labels in
    /// the given order.
    pub fn from_objects(objects: Vec<Object3D>) -> Self {
        Self { objects }.reset_labels()
    }

    /// Number of objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True if the population holds no objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterates over the objects in label order.
    pub fn iter(&self) -> impl Iterator<Item = &Object3D> {
        self.objects.iter()
    }

    /// Looks up an object by its current label.
    pub fn get(&self, label: u32) -> Option<&Object3D> {
        self.objects.iter().find(|o| o.label() == label)
    }

    /// Re-assigns labels densely as 1..=N in collection order.
    #[must_use]
    pub fn reset_labels(self) -> Self {
        let objects = self
            .objects
            .into_iter()
            .enumerate()
            .map(|(i, o)| o.with_label(i as u32 + 1))
            .collect();
        Self { objects }
    }

    /// Removes objects whose bounding box touches the outer XY boundary
    /// of the source volume. Objects touching only the Z boundary are
    /// kept. Survivors are relabeled densely.
    #[must_use]
    pub fn exclude_xy_borders(self, width: usize, height: usize) -> Self {
        let objects = self
            .objects
            .into_iter()
            .filter(|o| !o.bounding_box().touches_xy_border(width, height))
            .collect();
        Self { objects }.reset_labels()
    }

    /// Removes objects whose physical size falls outside `[min, max]`.
    ///
    /// Bounds are in physical units under the given measurement mode,
    /// so thresholds are calibration-independent. Survivors are
    /// relabeled densely.
    #[must_use]
    pub fn filter_size(self, min: f64, max: f64, cal: Calibration, mode: SizeMode) -> Self {
        let objects = self
            .objects
            .into_iter()
            .filter(|o| {
                let size = o.physical_size(cal, mode);
                size >= min && size <= max
            })
            .collect();
        Self { objects }.reset_labels()
    }

    /// Removes objects confined to a single Z slice.
    ///
    /// Single-slice detections out of a 3D segmentation are artifacts,
    /// not real objects. Survivors are relabeled densely.
    #[must_use]
    pub fn retain_multi_slice(self) -> Self {
        let objects = self
            .objects
            .into_iter()
            .filter(|o| !o.bounding_box().single_slice())
            .collect();
        Self { objects }.reset_labels()
    }

    /// Total voxel count across all objects.
    pub fn total_voxels(&self) -> usize {
        self.objects.iter().map(Object3D::voxel_count).sum()
    }
}

impl IntoIterator for Population {
    type Item = Object3D;
    type IntoIter = std::vec::IntoIter<Object3D>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_iter()
    }
}

impl FromIterator<Object3D> for Population {
    fn from_iter<I: IntoIterator<Item = Object3D>>(iter: I) -> Self {
        Self::from_objects(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::Voxel;

    fn obj(label: u32, voxels: &[(u32, u32, u32)]) -> Object3D {
        Object3D::new(
            label,
            voxels.iter().map(|&(x, y, z)| Voxel::new(x, y, z)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_reset_labels_dense() {
        let pop = Population::from_objects(vec![
            obj(17, &[(2, 2, 0)]),
            obj(4, &[(5, 5, 0)]),
            obj(9, &[(8, 8, 0)]),
        ]);
        let labels: Vec<u32> = pop.iter().map(Object3D::label).collect();
        assert_eq!(labels, vec![1, 2, 3]);
    }

    #[test]
    fn test_exclude_xy_borders_keeps_z_spanning() {
        let pop = Population::from_objects(vec![
            obj(1, &[(0, 5, 2)]),          // touches x=0
            obj(2, &[(5, 9, 2)]),          // touches y=height-1
            obj(3, &[(5, 5, 0), (5, 5, 9)]), // spans full Z only
            obj(4, &[(4, 4, 3)]),
        ]);
        let pop = pop.exclude_xy_borders(10, 10);
        assert_eq!(pop.len(), 2);
        assert_eq!(pop.get(1).unwrap().voxel_count(), 2);
    }

    #[test]
    fn test_filter_size_physical_bounds() {
        let cal = Calibration::new(2.0, 2.0, 1.0); // pixel area 4 µm²
        let pop = Population::from_objects(vec![
            obj(1, &[(1, 1, 0)]),                       // 4 µm²
            obj(2, &[(3, 3, 0), (4, 3, 0)]),            // 8 µm²
            obj(3, &[(6, 6, 0), (7, 6, 0), (6, 7, 0)]), // 12 µm²
        ]);
        let pop = pop.filter_size(5.0, 10.0, cal, SizeMode::Area);
        assert_eq!(pop.len(), 1);
        assert_eq!(pop.get(1).unwrap().voxel_count(), 2);
    }

    #[test]
    fn test_filter_size_idempotent() {
        let cal = Calibration::default();
        let pop = Population::from_objects(vec![
            obj(1, &[(1, 1, 0)]),
            obj(2, &[(3, 3, 0), (4, 3, 0)]),
        ]);
        let once = pop.clone().filter_size(1.5, 10.0, cal, SizeMode::Area);
        let twice = once.clone().filter_size(1.5, 10.0, cal, SizeMode::Area);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_retain_multi_slice() {
        let pop = Population::from_objects(vec![
            obj(1, &[(1, 1, 2)]),
            obj(2, &[(3, 3, 1), (3, 3, 2)]),
        ]);
        let pop = pop.retain_multi_slice();
        assert_eq!(pop.len(), 1);
        assert_eq!(pop.get(1).unwrap().voxel_count(), 2);
    }
}
