//! Axis-aligned surface extraction.
//!
//! A carved cloud is solid. The surface is approximated by the extremal voxels
//! along every axis-aligned line of sight: for each line parallel to an axis,
//! the voxels with the minimum and maximum coordinate on that axis.
//!
//! The three line families are processed independently and their results are
//! concatenated, so a voxel extremal along several axes appears several times.
//! Point-cloud export tolerates the repeats.

use hashbrown::HashMap;
use tracing::debug;

use crate::types::{Voxel, VoxelCloud};

/// Axis along which lines of sight run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in extraction order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Z, Axis::Y];

    /// The two fixed coordinates identifying the line through `v`.
    #[inline]
    fn line_key(self, v: &Voxel) -> (i32, i32) {
        match self {
            Axis::X => (v.z, v.y),
            Axis::Z => (v.x, v.y),
            Axis::Y => (v.x, v.z),
        }
    }

    /// Coordinate of `v` along this axis.
    #[inline]
    fn coord(self, v: &Voxel) -> i32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    /// Rebuild a voxel from a line key and a coordinate along the axis.
    #[inline]
    fn voxel(self, key: (i32, i32), value: i32) -> Voxel {
        match self {
            Axis::X => Voxel::new(value, key.1, key.0),
            Axis::Z => Voxel::new(key.0, key.1, value),
            Axis::Y => Voxel::new(key.0, value, key.1),
        }
    }
}

/// Minimum and maximum voxel on every line parallel to `axis`.
///
/// Lines are emitted in order of first appearance in the cloud. A line whose
/// minimum equals its maximum yields a single voxel.
pub fn line_extremes(cloud: &VoxelCloud, axis: Axis) -> Vec<Voxel> {
    let mut index: HashMap<(i32, i32), usize> = HashMap::new();
    let mut lines: Vec<((i32, i32), i32, i32)> = Vec::new();

    for v in cloud {
        let key = axis.line_key(v);
        let c = axis.coord(v);
        match index.get(&key) {
            Some(&i) => {
                let line = &mut lines[i];
                line.1 = line.1.min(c);
                line.2 = line.2.max(c);
            }
            None => {
                index.insert(key, lines.len());
                lines.push((key, c, c));
            }
        }
    }

    let mut out = Vec::with_capacity(lines.len() * 2);
    for (key, lo, hi) in lines {
        out.push(axis.voxel(key, lo));
        if hi != lo {
            out.push(axis.voxel(key, hi));
        }
    }
    out
}

/// Reduce a solid cloud to its boundary voxels.
///
/// Output is the x-extremes of every `(z, y)` line, then the z-extremes of
/// every `(x, y)` line, then the y-extremes of every `(x, z)` line.
pub fn extract_surface(cloud: VoxelCloud) -> VoxelCloud {
    let mut surface = VoxelCloud::with_capacity(cloud.len());
    for axis in Axis::ALL {
        let extremes = line_extremes(&cloud, axis);
        debug!(axis = ?axis, voxels = extremes.len(), "Line extremes");
        for v in extremes {
            surface.push(v);
        }
    }

    debug!(
        solid = cloud.len(),
        surface = surface.len(),
        "Surface extracted"
    );
    surface
}
