//! Export-resolution reduction of voxel coordinates.

use crate::types::{Voxel, VoxelCloud};

/// Divisor applied to coordinates: `ceil(step / 2)` for `step > 1`, else 1.
pub fn reduction_divisor(step: i32) -> i32 {
    if step > 1 {
        (step + 1) / 2
    } else {
        1
    }
}

/// Divide every coordinate by [`reduction_divisor`], truncating toward zero.
pub fn reduce_resolution(cloud: VoxelCloud, step: i32) -> VoxelCloud {
    let d = reduction_divisor(step);
    if d == 1 {
        return cloud;
    }
    cloud
        .into_iter()
        .map(|v| Voxel::new(v.x / d, v.y / d, v.z / d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisor() {
        assert_eq!(reduction_divisor(0), 1);
        assert_eq!(reduction_divisor(1), 1);
        assert_eq!(reduction_divisor(2), 1);
        assert_eq!(reduction_divisor(3), 2);
        assert_eq!(reduction_divisor(4), 2);
        assert_eq!(reduction_divisor(5), 3);
    }

    #[test]
    fn test_step_one_is_identity() {
        let cloud = VoxelCloud::from_voxels(vec![Voxel::new(7, -3, 11), Voxel::new(0, 5, 1)]);
        assert_eq!(reduce_resolution(cloud.clone(), 1), cloud);
    }

    #[test]
    fn test_truncates_toward_zero() {
        let cloud = VoxelCloud::from_voxels(vec![Voxel::new(9, -5, 4)]);
        let reduced = reduce_resolution(cloud, 4);
        assert_eq!(reduced.voxels(), &[Voxel::new(4, -2, 2)]);
    }
}
