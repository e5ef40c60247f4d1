//! Core data types: silhouette slices and sets, voxels and voxel clouds.

use std::path::PathBuf;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{HullError, HullResult};

/// One sampled image row's horizontal silhouette boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slice {
    /// Image row (pixels).
    pub row: i32,
    /// Leftmost silhouette column.
    pub left: i32,
    /// Rightmost silhouette column.
    pub right: i32,
}

impl Slice {
    /// Create a slice.
    #[inline]
    pub fn new(row: i32, left: i32, right: i32) -> Self {
        Self { row, left, right }
    }

    /// Horizontal extent of the slice.
    #[inline]
    pub fn span(&self) -> i32 {
        self.right - self.left
    }

    /// Whether `x` lies strictly between the boundaries.
    #[inline]
    pub fn contains_open(&self, x: i32) -> bool {
        self.left < x && x < self.right
    }
}

/// Ordered silhouette slices for a single view angle.
///
/// Rows are ascending, so the first slice holds the minimum row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilhouetteSet {
    /// Slices, one per sampled row.
    pub slices: Vec<Slice>,
}

impl SilhouetteSet {
    /// Create a set from slices in ascending row order.
    pub fn new(slices: Vec<Slice>) -> Self {
        Self { slices }
    }

    /// Number of slices.
    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether the set has no slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Row of the first slice.
    pub fn first_row(&self) -> Option<i32> {
        self.slices.first().map(|s| s.row)
    }

    /// Row of the last slice.
    pub fn last_row(&self) -> Option<i32> {
        self.slices.last().map(|s| s.row)
    }

    /// `last_row - first_row`.
    pub fn row_extent(&self) -> Option<i32> {
        Some(self.last_row()? - self.first_row()?)
    }

    /// Minimum left boundary over all slices.
    pub fn min_left(&self) -> Option<i32> {
        self.slices.iter().map(|s| s.left).min()
    }

    /// Maximum right boundary over all slices.
    pub fn max_right(&self) -> Option<i32> {
        self.slices.iter().map(|s| s.right).max()
    }

    /// Widest single-row span.
    pub fn widest_span(&self) -> Option<i32> {
        self.slices.iter().map(Slice::span).max()
    }

    /// Width selector that writes `right = left` into every slice as a side
    /// effect and returns the maximum left boundary.
    ///
    /// Destroys the set's horizontal extents. Only used under
    /// [`SpanMode::CollapseRight`](crate::SpanMode::CollapseRight).
    pub fn collapse_right(&mut self) -> Option<i32> {
        for slice in &mut self.slices {
            slice.right = slice.left;
        }
        self.slices.iter().map(|s| s.left).max()
    }

    /// Shift the set so its minimum row and minimum left boundary are zero.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::EmptyInput`] for an empty set.
    pub fn normalized(mut self) -> HullResult<Self> {
        let (Some(min_row), Some(min_left)) = (self.first_row(), self.min_left()) else {
            return Err(HullError::empty_input("cannot normalize a set without slices"));
        };

        for slice in &mut self.slices {
            slice.row -= min_row;
            slice.left -= min_left;
            slice.right -= min_left;
        }

        Ok(self)
    }

    /// All slices whose row equals `row`.
    pub fn slices_at_row(&self, row: i32) -> impl Iterator<Item = &Slice> {
        let start = self.slices.partition_point(|s| s.row < row);
        self.slices[start..].iter().take_while(move |s| s.row == row)
    }

    /// Iterate over slices.
    pub fn iter(&self) -> std::slice::Iter<'_, Slice> {
        self.slices.iter()
    }
}

impl FromIterator<Slice> for SilhouetteSet {
    fn from_iter<I: IntoIterator<Item = Slice>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A silhouette set together with the image it was extracted from.
#[derive(Debug, Clone)]
pub struct View {
    /// Source image path.
    pub path: PathBuf,
    /// Serial number embedded in the filename.
    pub serial: u32,
    /// Extracted silhouette.
    pub silhouette: SilhouetteSet,
}

/// An integer lattice cell of the reconstruction.
///
/// Coordinates are in pixels and advance by the configured step; `y` is the
/// vertical (rotation) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Voxel {
    /// Column in the reference view (pixels).
    pub x: i32,
    /// Image row, along the turntable axis (pixels).
    pub y: i32,
    /// Depth (pixels).
    pub z: i32,
}

impl Voxel {
    /// Create a voxel.
    #[inline]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position as a lattice point.
    #[inline]
    pub fn position(&self) -> Point3<i32> {
        Point3::new(self.x, self.y, self.z)
    }
}

/// The working set of candidate solid voxels.
///
/// Stages consume a cloud by value and return a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoxelCloud {
    voxels: Vec<Voxel>,
}

impl VoxelCloud {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self { voxels: Vec::new() }
    }

    /// Create an empty cloud with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            voxels: Vec::with_capacity(capacity),
        }
    }

    /// Create a cloud from voxels.
    pub fn from_voxels(voxels: Vec<Voxel>) -> Self {
        Self { voxels }
    }

    /// Number of voxels (duplicates included).
    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Whether the cloud has no voxels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Add a voxel.
    #[inline]
    pub fn push(&mut self, voxel: Voxel) {
        self.voxels.push(voxel);
    }

    /// Borrow the voxels.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Take the voxels out of the cloud.
    pub fn into_voxels(self) -> Vec<Voxel> {
        self.voxels
    }

    /// Iterate over voxels.
    pub fn iter(&self) -> std::slice::Iter<'_, Voxel> {
        self.voxels.iter()
    }

    /// Axis-aligned bounds as (min, max), or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<(Point3<i32>, Point3<i32>)> {
        let first = self.voxels.first()?.position();
        Some(self.voxels.iter().fold((first, first), |(min, max), v| {
            (
                Point3::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z)),
                Point3::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z)),
            )
        }))
    }
}

impl FromIterator<Voxel> for VoxelCloud {
    fn from_iter<I: IntoIterator<Item = Voxel>>(iter: I) -> Self {
        Self::from_voxels(iter.into_iter().collect())
    }
}

impl IntoIterator for VoxelCloud {
    type Item = Voxel;
    type IntoIter = std::vec::IntoIter<Voxel>;

    fn into_iter(self) -> Self::IntoIter {
        self.voxels.into_iter()
    }
}

impl<'a> IntoIterator for &'a VoxelCloud {
    type Item = &'a Voxel;
    type IntoIter = std::slice::Iter<'a, Voxel>;

    fn into_iter(self) -> Self::IntoIter {
        self.voxels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> SilhouetteSet {
        SilhouetteSet::new(vec![
            Slice::new(12, 30, 40),
            Slice::new(16, 28, 44),
            Slice::new(20, 33, 35),
        ])
    }

    #[test]
    fn test_normalize_shifts_to_origin() {
        let set = sample_set().normalized().unwrap();
        assert_eq!(set.first_row(), Some(0));
        assert_eq!(set.min_left(), Some(0));
        assert_eq!(set.slices[1], Slice::new(4, 0, 16));
        assert_eq!(set.slices[2], Slice::new(8, 5, 7));
    }

    #[test]
    fn test_normalize_empty_fails() {
        let err = SilhouetteSet::default().normalized().unwrap_err();
        assert!(matches!(err, HullError::EmptyInput { .. }));
    }

    #[test]
    fn test_span_summaries() {
        let set = sample_set();
        assert_eq!(set.widest_span(), Some(16));
        assert_eq!(set.row_extent(), Some(8));
        assert_eq!(set.max_right(), Some(44));
    }

    #[test]
    fn test_collapse_right_overwrites_every_slice() {
        let mut set = sample_set();
        assert_eq!(set.collapse_right(), Some(33));
        assert!(set.iter().all(|s| s.right == s.left));
        assert_eq!(set.widest_span(), Some(0));
    }

    #[test]
    fn test_slices_at_row() {
        let set = sample_set();
        let found: Vec<_> = set.slices_at_row(16).collect();
        assert_eq!(found, vec![&Slice::new(16, 28, 44)]);
        assert_eq!(set.slices_at_row(14).count(), 0);
        assert_eq!(set.slices_at_row(99).count(), 0);
    }

    #[test]
    fn test_voxel_axes() {
        let v = Voxel::new(3, 7, -2);
        assert_eq!(v.position(), Point3::new(3, 7, -2));
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"x":3,"y":7,"z":-2}"#
        );
    }

    #[test]
    fn test_cloud_bounds() {
        let cloud: VoxelCloud = [Voxel::new(2, 0, 4), Voxel::new(-1, 6, 2)]
            .into_iter()
            .collect();
        let (min, max) = cloud.bounds().unwrap();
        assert_eq!(min, Point3::new(-1, 0, 2));
        assert_eq!(max, Point3::new(2, 6, 4));
        assert!(VoxelCloud::new().bounds().is_none());
    }
}
