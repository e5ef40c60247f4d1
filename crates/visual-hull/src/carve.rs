//! Voxel lattice construction and silhouette cuts.
//!
//! Carving starts from a dense rectangular lattice ([`build_cloud`]), cuts it
//! once against the narrowest view ([`reference_cut`]), then intersects it with
//! every other view after re-projecting it around the vertical turntable axis
//! ([`rotational_cut`]).
//!
//! # Coordinate frame
//!
//! Voxel coordinates are pixels. `y` is the rotation axis and matches the image
//! row; `x` matches the image column of the reference view; `z` is depth.
//!
//! # Memory
//!
//! The initial lattice holds `(y_size/step) * (min_width/step) * (max_width/step)`
//! voxels and dominates peak memory. Use [`estimated_voxel_count`] to check the
//! size before building it.

use tracing::{debug, warn};

use crate::error::{HullError, HullResult};
use crate::types::{SilhouetteSet, Voxel, VoxelCloud};

/// Number of lattice points `0, step, 2*step, ...` below `extent`.
fn samples(extent: i32, step: i32) -> u64 {
    if extent <= 0 {
        0
    } else {
        ((extent + step - 1) / step) as u64
    }
}

/// Number of voxels [`build_cloud`] would produce.
pub fn estimated_voxel_count(y_size: i32, min_width: i32, max_width: i32, step: i32) -> u64 {
    if step <= 0 {
        return 0;
    }
    samples(y_size, step)
        .saturating_mul(samples(min_width, step))
        .saturating_mul(samples(max_width, step))
}

/// Build the dense starting lattice.
///
/// Produces every `(x, y, z)` with `0 <= y < y_size`, `0 <= x < min_width` and
/// `0 <= z < max_width`, each coordinate advancing by `step`.
///
/// # Errors
///
/// Returns [`HullError::InvalidConfig`] if `step` is not positive.
pub fn build_cloud(y_size: i32, min_width: i32, max_width: i32, step: i32) -> HullResult<VoxelCloud> {
    if step <= 0 {
        return Err(HullError::invalid_config(format!(
            "step must be positive, got {}",
            step
        )));
    }

    let count = estimated_voxel_count(y_size, min_width, max_width, step);
    debug!(
        y_size,
        min_width,
        max_width,
        step,
        voxels = count,
        "Building initial lattice"
    );

    let mut cloud = VoxelCloud::with_capacity(usize::try_from(count).unwrap_or(0));
    for y in (0..y_size).step_by(step as usize) {
        for x in (0..min_width).step_by(step as usize) {
            for z in (0..max_width).step_by(step as usize) {
                cloud.push(Voxel::new(x, y, z));
            }
        }
    }

    Ok(cloud)
}

/// First cut: keep voxels strictly inside the reference silhouette.
///
/// A voxel survives iff some slice has `row == voxel.y` and
/// `left < voxel.x < right`.
pub fn reference_cut(cloud: VoxelCloud, view: &SilhouetteSet) -> VoxelCloud {
    let before = cloud.len();
    let kept: VoxelCloud = cloud
        .into_iter()
        .filter(|v| view.slices_at_row(v.y).any(|s| s.contains_open(v.x)))
        .collect();

    debug!(before, after = kept.len(), "Reference cut");
    kept
}

/// Horizontal image coordinate of a voxel seen after turning the object by
/// `angle_rad` around the vertical axis.
///
/// `round(r * cos(beta + angle))` with `r = sqrt(x^2 + z^2)` and
/// `beta = atan2(z, x)`.
#[inline]
pub fn project(voxel: &Voxel, angle_rad: f64) -> i32 {
    let x = voxel.x as f64;
    let z = voxel.z as f64;
    let radius = (x * x + z * z).sqrt();
    let bearing = z.atan2(x);
    (radius * (bearing + angle_rad).cos()).round() as i32
}

/// Per-row minimum and maximum projected coordinates of a cloud.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionEnvelope {
    rows: Vec<Option<(i32, i32)>>,
}

impl ProjectionEnvelope {
    /// Empty envelope covering `rows` row indices.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            rows: vec![None; rows],
        }
    }

    /// Widen the envelope of row `index` to include `value`.
    /// Indices outside the envelope are ignored.
    pub fn include(&mut self, index: usize, value: i32) {
        if let Some(entry) = self.rows.get_mut(index) {
            *entry = Some(match *entry {
                Some((lo, hi)) => (lo.min(value), hi.max(value)),
                None => (value, value),
            });
        }
    }

    /// `(min, max)` for row `index`, if any voxel landed there.
    pub fn row(&self, index: usize) -> Option<(i32, i32)> {
        self.rows.get(index).copied().flatten()
    }

    /// Smallest left value over all populated rows.
    pub fn min_left(&self) -> Option<i32> {
        self.rows.iter().flatten().map(|&(lo, _)| lo).min()
    }

    /// Largest right value over all populated rows.
    pub fn max_right(&self) -> Option<i32> {
        self.rows.iter().flatten().map(|&(_, hi)| hi).max()
    }
}

/// Shift that aligns the centre of the projection with the centre of the view.
///
/// `(max(env.right) + min(env.left))/2 - (max(view.right) + min(view.left))/2`
/// using truncating integer division. `None` when either side is empty.
pub fn centering_offset(envelope: &ProjectionEnvelope, view: &SilhouetteSet) -> Option<i32> {
    let projected_centre = (envelope.max_right()? + envelope.min_left()?) / 2;
    let view_centre = (view.max_right()? + view.min_left()?) / 2;
    Some(projected_centre - view_centre)
}

/// Row index of a voxel within a silhouette set.
#[inline]
fn row_index(voxel: &Voxel, step: i32) -> Option<usize> {
    usize::try_from(voxel.y / step).ok()
}

/// Whether a voxel with corrected projection `corrected` fits the view.
///
/// The slice at the voxel's row index must have `row == voxel.y` and
/// `left - tolerance < corrected < right + tolerance`. The widened bounds
/// saturate at the `i32` range.
#[inline]
pub fn fits_view(
    voxel: &Voxel,
    corrected: i32,
    view: &SilhouetteSet,
    step: i32,
    tolerance: i32,
) -> bool {
    row_index(voxel, step)
        .and_then(|i| view.slices.get(i))
        .is_some_and(|s| {
            s.row == voxel.y
                && corrected > s.left.saturating_sub(tolerance)
                && corrected < s.right.saturating_add(tolerance)
        })
}

/// Result of a rotational cut.
#[derive(Debug, Clone)]
pub struct RotationalCut {
    /// Surviving voxels.
    pub cloud: VoxelCloud,
    /// Centering offset applied, `None` if the input cloud projected nowhere.
    pub offset: Option<i32>,
}

/// Intersect the cloud with a view taken after `angle_deg` degrees of rotation.
///
/// Every voxel is projected onto the view's image plane. A per-row envelope of
/// the projections gives the centering offset; a voxel is kept iff its
/// projection minus the offset lies strictly inside the slice for its row
/// (widened by `tolerance`).
pub fn rotational_cut(
    cloud: VoxelCloud,
    view: &SilhouetteSet,
    angle_deg: f64,
    step: i32,
    tolerance: i32,
) -> RotationalCut {
    let angle_rad = angle_deg.to_radians();
    let projections: Vec<i32> = cloud.iter().map(|v| project(v, angle_rad)).collect();

    let mut envelope = ProjectionEnvelope::with_rows(view.len());
    for (voxel, &p) in cloud.iter().zip(&projections) {
        if let Some(index) = row_index(voxel, step) {
            envelope.include(index, p);
        }
    }

    let Some(offset) = centering_offset(&envelope, view) else {
        if !cloud.is_empty() {
            warn!(
                voxels = cloud.len(),
                angle = angle_deg,
                "No voxel projects onto the view; cloud is emptied"
            );
        }
        return RotationalCut {
            cloud: VoxelCloud::new(),
            offset: None,
        };
    };

    let before = cloud.len();
    let kept: VoxelCloud = cloud
        .into_iter()
        .zip(projections)
        .filter(|(v, p)| fits_view(v, p - offset, view, step, tolerance))
        .map(|(v, _)| v)
        .collect();

    debug!(
        angle = angle_deg,
        offset,
        before,
        after = kept.len(),
        "Rotational cut"
    );

    RotationalCut {
        cloud: kept,
        offset: Some(offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Slice;

    /// Lattice disc of radius `r` centred on the axis, `height` rows tall.
    fn cylinder(radius: i32, height: i32) -> VoxelCloud {
        let mut cloud = VoxelCloud::new();
        for y in 0..height {
            for x in -radius..=radius {
                for z in -radius..=radius {
                    if x * x + z * z <= radius * radius {
                        cloud.push(Voxel::new(x, y, z));
                    }
                }
            }
        }
        cloud
    }

    fn rectangle(height: i32, width: i32) -> SilhouetteSet {
        (0..height).map(|row| Slice::new(row, 0, width)).collect()
    }

    #[test]
    fn test_build_cloud_dimensions() {
        let cloud = build_cloud(8, 6, 10, 2).unwrap();
        assert_eq!(cloud.len(), 4 * 3 * 5);
        assert_eq!(cloud.len() as u64, estimated_voxel_count(8, 6, 10, 2));
        assert_eq!(cloud.voxels()[0], Voxel::new(0, 0, 0));
        assert_eq!(cloud.voxels()[1], Voxel::new(0, 0, 2));
        assert!(cloud.iter().all(|v| v.x < 6 && v.y < 8 && v.z < 10));
    }

    #[test]
    fn test_build_cloud_non_multiple_extent() {
        let cloud = build_cloud(5, 5, 5, 2).unwrap();
        assert_eq!(cloud.len(), 27);
        assert_eq!(estimated_voxel_count(5, 5, 5, 2), 27);
    }

    #[test]
    fn test_build_cloud_rejects_bad_step() {
        assert!(build_cloud(4, 4, 4, 0).is_err());
        assert_eq!(estimated_voxel_count(4, 4, 4, -1), 0);
    }

    #[test]
    fn test_reference_cut_is_strict() {
        let cloud = build_cloud(2, 6, 2, 1).unwrap();
        let view = SilhouetteSet::new(vec![Slice::new(0, 1, 4), Slice::new(1, 0, 2)]);
        let cut = reference_cut(cloud, &view);

        let mut kept: Vec<_> = cut.iter().map(|v| (v.x, v.y)).collect();
        kept.sort();
        kept.dedup();
        assert_eq!(kept, vec![(1, 1), (2, 0), (3, 0)]);
        assert_eq!(cut.len(), 3 * 2);
    }

    #[test]
    fn test_reference_cut_minimal_scenario() {
        let cloud = build_cloud(2, 4, 4, 2).unwrap();
        let view = SilhouetteSet::new(vec![Slice::new(0, 0, 4)]);
        let cut = reference_cut(cloud, &view);
        assert_eq!(
            cut.voxels(),
            &[Voxel::new(2, 0, 0), Voxel::new(2, 0, 2)]
        );
    }

    #[test]
    fn test_project_quarter_turn() {
        let v = Voxel::new(10, 0, 0);
        assert_eq!(project(&v, 0.0), 10);
        assert_eq!(project(&v, 90f64.to_radians()), 0);
        assert_eq!(project(&v, 180f64.to_radians()), -10);
        assert_eq!(project(&Voxel::new(0, 0, 10), 90f64.to_radians()), -10);
    }

    #[test]
    fn test_envelope_and_offset() {
        let mut envelope = ProjectionEnvelope::with_rows(2);
        envelope.include(0, 3);
        envelope.include(0, -5);
        envelope.include(1, 8);
        envelope.include(7, 100);
        assert_eq!(envelope.row(0), Some((-5, 3)));
        assert_eq!(envelope.row(1), Some((8, 8)));
        assert_eq!(envelope.max_right(), Some(8));
        assert_eq!(envelope.min_left(), Some(-5));

        let view = rectangle(2, 10);
        // (8 + -5) / 2 - (10 + 0) / 2 = 1 - 5
        assert_eq!(centering_offset(&envelope, &view), Some(-4));
        assert_eq!(
            centering_offset(&ProjectionEnvelope::with_rows(2), &view),
            None
        );
    }

    #[test]
    fn test_offset_truncates_toward_zero() {
        let mut envelope = ProjectionEnvelope::with_rows(1);
        envelope.include(0, -3);
        envelope.include(0, 0);
        let view = SilhouetteSet::new(vec![Slice::new(0, 0, 3)]);
        // (-3 + 0) / 2 = -1, (3 + 0) / 2 = 1
        assert_eq!(centering_offset(&envelope, &view), Some(-2));
    }

    #[test]
    fn test_rotational_cut_identity_at_zero_angle() {
        let cloud = build_cloud(3, 8, 8, 1).unwrap();
        let view = rectangle(3, 9);
        let cut = reference_cut(cloud, &view);
        let before = cut.clone();

        let result = rotational_cut(cut, &view, 0.0, 1, 0);
        // projections 1..=7, centre 4; view centre 4
        assert_eq!(result.offset, Some(0));
        assert_eq!(result.cloud, before);
    }

    #[test]
    fn test_rotational_cut_containment() {
        let cloud = build_cloud(4, 12, 12, 2).unwrap();
        let view = SilhouetteSet::new(vec![
            Slice::new(0, 0, 6),
            Slice::new(2, 1, 9),
            Slice::new(4, 0, 4),
        ]);
        let result = rotational_cut(cloud, &view, 35.0, 2, 0);
        let offset = result.offset.unwrap();

        assert!(!result.cloud.is_empty());
        for v in &result.cloud {
            let slice = view.slices[(v.y / 2) as usize];
            let corrected = project(v, 35f64.to_radians()) - offset;
            assert_eq!(slice.row, v.y);
            assert!(slice.left < corrected && corrected < slice.right);
        }
    }

    #[test]
    fn test_rotational_cut_drops_rows_outside_view() {
        let cloud = build_cloud(6, 4, 4, 2).unwrap();
        let view = rectangle(1, 20);
        let result = rotational_cut(cloud, &view, 0.0, 2, 0);
        assert!(result.cloud.iter().all(|v| v.y == 0));
    }

    #[test]
    fn test_rotational_cut_empty_cloud() {
        let result = rotational_cut(VoxelCloud::new(), &rectangle(2, 4), 30.0, 1, 0);
        assert!(result.cloud.is_empty());
        assert_eq!(result.offset, None);
    }

    #[test]
    fn test_tolerance_widens_containment() {
        let cloud = VoxelCloud::from_voxels(vec![Voxel::new(0, 0, 0), Voxel::new(4, 0, 0)]);
        let view = SilhouetteSet::new(vec![Slice::new(0, 0, 4)]);
        // offset = (4 + 0)/2 - (4 + 0)/2 = 0, both voxels sit on the boundary
        assert!(rotational_cut(cloud.clone(), &view, 0.0, 1, 0).cloud.is_empty());
        assert_eq!(rotational_cut(cloud.clone(), &view, 0.0, 1, 1).cloud.len(), 2);
        assert_eq!(rotational_cut(cloud, &view, 0.0, 1, i32::MAX).cloud.len(), 2);
    }

    #[test]
    fn test_cylinder_is_invariant_under_rotation() {
        let height = 10;
        let disc = cylinder(5, height);
        let initial = disc.len();
        // Diameter 10 plus one voxel of clearance either side of the strict test.
        let view = rectangle(height, 12);

        let mut cloud = disc;
        for i in 0..8 {
            let result = rotational_cut(cloud, &view, 12.5 * i as f64, 1, 0);
            assert_eq!(result.offset, Some(-6));
            cloud = result.cloud;
            assert_eq!(cloud.len(), initial, "cut {} removed voxels", i);
        }
    }

    #[test]
    fn test_cylinder_tight_silhouette_keeps_core() {
        let height = 10;
        let disc = cylinder(5, height);
        assert_eq!(disc.len(), 81 * 10);
        let view = rectangle(height, 10);

        let mut cloud = disc;
        for i in 0..8 {
            cloud = rotational_cut(cloud, &view, 12.5 * i as f64, 1, 0).cloud;
        }

        // Each row loses the same 8 rim voxels that land on the silhouette edge.
        assert_eq!(cloud.len(), 73 * 10);
        for y in 0..height {
            let row: Vec<_> = cloud.iter().filter(|v| v.y == y).collect();
            assert_eq!(row.len(), 73, "row {}", y);
        }
        let core = cylinder(4, height);
        assert!(core.iter().all(|v| cloud.voxels().contains(v)));
        assert!(cloud.iter().all(|v| v.x * v.x + v.z * v.z <= 25));
    }

    #[test]
    fn test_fits_view_with_extreme_tolerance() {
        let view = SilhouetteSet::new(vec![Slice::new(0, -5, 5)]);
        let voxel = Voxel::new(0, 0, 0);
        assert!(fits_view(&voxel, i32::MIN + 1, &view, 1, i32::MAX));
        assert!(fits_view(&voxel, i32::MAX - 1, &view, 1, i32::MAX));
        assert!(!fits_view(&voxel, 5, &view, 1, 0));
        assert!(!fits_view(&Voxel::new(0, 1, 0), 0, &view, 1, i32::MAX));
    }
}
