//! Connected-component labeling of binary and pre-labeled volumes.

use ndarray::Array3;
use puncta_core::{MaskVolume, Object3D, Population, Result, Voxel};

/// Union-Find data structure for connected component detection.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);

        if px == py {
            return;
        }

        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
    }
}

/// The 13 neighbor offsets that precede a voxel in `(z, y, x)` raster
/// order; together with their mirrors they form the 26-neighborhood.
const BACKWARD_NEIGHBORS: [(i64, i64, i64); 13] = [
    (-1, -1, -1),
    (-1, -1, 0),
    (-1, -1, 1),
    (-1, 0, -1),
    (-1, 0, 0),
    (-1, 0, 1),
    (-1, 1, -1),
    (-1, 1, 0),
    (-1, 1, 1),
    (0, -1, -1),
    (0, -1, 0),
    (0, -1, 1),
    (0, 0, -1),
];

/// Extracts one object per 26-connected component of same-valued
/// nonzero voxels, densely labeled from 1 in raster-scan discovery
/// order.
///
/// Works on binary volumes (every nonzero voxel has the same value)
/// and on pre-labeled volumes, where touching components with distinct
/// values stay distinct objects.
pub fn extract_components<A>(volume: &Array3<A>) -> Result<Population>
where
    A: Copy + PartialEq + Default,
{
    let (depth, height, width) = volume.dim();
    let background = A::default();

    // Dense index per foreground voxel, raster order
    let mut dense: Vec<u32> = vec![u32::MAX; depth * height * width];
    let mut voxels: Vec<Voxel> = Vec::new();
    for ((z, y, x), &v) in volume.indexed_iter() {
        if v != background {
            dense[(z * height + y) * width + x] = voxels.len() as u32;
            voxels.push(Voxel::new(x as u32, y as u32, z as u32));
        }
    }
    if voxels.is_empty() {
        return Ok(Population::new());
    }

    let mut uf = UnionFind::new(voxels.len());
    for (i, v) in voxels.iter().enumerate() {
        let value = volume[v.index()];
        for (dz, dy, dx) in BACKWARD_NEIGHBORS {
            let nz = i64::from(v.z) + dz;
            let ny = i64::from(v.y) + dy;
            let nx = i64::from(v.x) + dx;
            if nz < 0 || ny < 0 || nx < 0 || ny >= height as i64 || nx >= width as i64 {
                continue;
            }
            let flat = ((nz as usize) * height + ny as usize) * width + nx as usize;
            let j = dense[flat];
            if j != u32::MAX && volume[(nz as usize, ny as usize, nx as usize)] == value {
                uf.union(i, j as usize);
            }
        }
    }

    // Group voxels by root, component order = first-voxel raster order
    let mut component_of_root: Vec<u32> = vec![u32::MAX; voxels.len()];
    let mut components: Vec<Vec<Voxel>> = Vec::new();
    for i in 0..voxels.len() {
        let root = uf.find(i);
        let c = if component_of_root[root] == u32::MAX {
            component_of_root[root] = components.len() as u32;
            components.push(Vec::new());
            components.len() - 1
        } else {
            component_of_root[root] as usize
        };
        components[c].push(voxels[i]);
    }

    let objects = components
        .into_iter()
        .enumerate()
        .map(|(i, vs)| Object3D::new(i as u32 + 1, vs))
        .collect::<Result<Vec<_>>>()?;
    Ok(Population::from_objects(objects))
}

/// [`extract_components`] specialized to binary masks.
pub fn extract_components_masked(mask: &MaskVolume) -> Result<Population> {
    extract_components(mask)
}
