//! Binary hole filling.

use puncta_core::MaskVolume;
use std::collections::VecDeque;

/// Fills enclosed background holes in a binary mask, slice by slice.
///
/// Background pixels 4-connected to the XY border of their slice stay
/// background; every other background pixel is enclosed by foreground
/// and becomes foreground. Thresholding ring-shaped foci leaves such
/// internal holes; real foci are solid blobs.
#[must_use]
pub fn fill_holes(mask: &MaskVolume) -> MaskVolume {
    let (depth, height, width) = mask.dim();
    let mut out = mask.clone();

    let mut outside = vec![false; height * width];
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    for z in 0..depth {
        outside.fill(false);
        queue.clear();

        // Seed from all border background pixels
        for y in 0..height {
            for x in [0, width - 1] {
                if mask[(z, y, x)] == 0 && !outside[y * width + x] {
                    outside[y * width + x] = true;
                    queue.push_back((y, x));
                }
            }
        }
        for x in 0..width {
            for y in [0, height - 1] {
                if mask[(z, y, x)] == 0 && !outside[y * width + x] {
                    outside[y * width + x] = true;
                    queue.push_back((y, x));
                }
            }
        }

        while let Some((y, x)) = queue.pop_front() {
            let mut visit = |ny: usize, nx: usize| {
                if mask[(z, ny, nx)] == 0 && !outside[ny * width + nx] {
                    outside[ny * width + nx] = true;
                    queue.push_back((ny, nx));
                }
            };
            if y > 0 {
                visit(y - 1, x);
            }
            if y + 1 < height {
                visit(y + 1, x);
            }
            if x > 0 {
                visit(y, x - 1);
            }
            if x + 1 < width {
                visit(y, x + 1);
            }
        }

        for y in 0..height {
            for x in 0..width {
                if mask[(z, y, x)] == 0 && !outside[y * width + x] {
                    out[(z, y, x)] = 1;
                }
            }
        }
    }
    out
}
