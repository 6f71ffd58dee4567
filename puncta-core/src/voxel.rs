//! Voxel coordinates and bounding boxes.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single voxel coordinate within a volume.
///
/// Field order is `(z, y, x)` so the derived ordering matches raster
/// scan order through a stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Voxel {
    /// Z coordinate (slice).
    pub z: u32,
    /// Y coordinate (row).
    pub y: u32,
    /// X coordinate (column).
    pub x: u32,
}

impl Voxel {
    /// Creates a new voxel coordinate.
    #[inline]
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { z, y, x }
    }

    /// Index tuple in `(z, y, x)` volume order.
    #[inline]
    pub fn index(&self) -> (usize, usize, usize) {
        (self.z as usize, self.y as usize, self.x as usize)
    }
}

/// Inclusive axis-aligned bounding box of a 3D object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Minimum X coordinate.
    pub xmin: u32,
    /// Maximum X coordinate.
    pub xmax: u32,
    /// Minimum Y coordinate.
    pub ymin: u32,
    /// Maximum Y coordinate.
    pub ymax: u32,
    /// Minimum Z coordinate.
    pub zmin: u32,
    /// Maximum Z coordinate.
    pub zmax: u32,
}

impl BoundingBox {
    /// Creates a degenerate box containing a single voxel.
    pub fn of(v: Voxel) -> Self {
        Self {
            xmin: v.x,
            xmax: v.x,
            ymin: v.y,
            ymax: v.y,
            zmin: v.z,
            zmax: v.z,
        }
    }

    /// Grows the box to include the given voxel.
    pub fn include(&mut self, v: Voxel) {
        self.xmin = self.xmin.min(v.x);
        self.xmax = self.xmax.max(v.x);
        self.ymin = self.ymin.min(v.y);
        self.ymax = self.ymax.max(v.y);
        self.zmin = self.zmin.min(v.z);
        self.zmax = self.zmax.max(v.z);
    }

    /// True if the box touches the outer XY boundary of a volume of the
    /// given lateral extent. The Z boundary is deliberately not tested:
    /// objects may legitimately span the full stack depth.
    #[inline]
    pub fn touches_xy_border(&self, width: usize, height: usize) -> bool {
        self.xmin == 0
            || self.ymin == 0
            || self.xmax as usize == width - 1
            || self.ymax as usize == height - 1
    }

    /// True if the box is confined to a single Z slice.
    #[inline]
    pub fn single_slice(&self) -> bool {
        self.zmin == self.zmax
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voxel_raster_order() {
        let a = Voxel::new(5, 0, 0);
        let b = Voxel::new(0, 1, 0);
        let c = Voxel::new(0, 0, 1);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_bounding_box_include() {
        let mut bb = BoundingBox::of(Voxel::new(3, 4, 1));
        bb.include(Voxel::new(7, 2, 2));
        assert_eq!(bb.xmin, 3);
        assert_eq!(bb.xmax, 7);
        assert_eq!(bb.ymin, 2);
        assert_eq!(bb.ymax, 4);
        assert_eq!(bb.zmin, 1);
        assert_eq!(bb.zmax, 2);
    }

    #[test]
    fn test_border_test_ignores_z() {
        let bb = BoundingBox {
            xmin: 2,
            xmax: 5,
            ymin: 2,
            ymax: 5,
            zmin: 0,
            zmax: 9,
        };
        assert!(!bb.touches_xy_border(10, 10));

        let edge = BoundingBox { xmin: 0, ..bb };
        assert!(edge.touches_xy_border(10, 10));
    }

    #[test]
    fn test_single_slice() {
        let mut bb = BoundingBox::of(Voxel::new(1, 1, 4));
        assert!(bb.single_slice());
        bb.include(Voxel::new(1, 1, 5));
        assert!(!bb.single_slice());
    }
}
