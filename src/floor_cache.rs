//! Per-agent memo table of floor heights keyed by a coarse grid cell.
//!
//! Agents probe the same square metre over and over, within a tick and
//! across ticks. Remembering the answer per `0.25 x 0.25 x 1.0` cell removes
//! most repeated downward probes. Floor changes are rare; whoever changes
//! the world must call [`FloorHeightCache::reset`].

use glam::Vec3;
use hashbrown::HashMap;

use crate::constants::{FLOOR_CELL_HEIGHT, FLOOR_CELL_SIZE};
use crate::geometry::Aabb;
use crate::numeric::{cell_index, cell_origin};

/// Quantised key of a floor cache cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloorCellKey {
    /// Horizontal cell index along X.
    pub x: i32,
    /// Horizontal cell index along Y.
    pub y: i32,
    /// Vertical bucket. Separates stacked floors; never interpolated.
    pub z: i32,
}

impl FloorCellKey {
    /// Quantises a world position.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            x: cell_index(position.x, FLOOR_CELL_SIZE),
            y: cell_index(position.y, FLOOR_CELL_SIZE),
            z: cell_index(position.z, FLOOR_CELL_HEIGHT),
        }
    }

    /// World-space bounds of the cell.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let min = Vec3::new(
            cell_origin(self.x, FLOOR_CELL_SIZE),
            cell_origin(self.y, FLOOR_CELL_SIZE),
            cell_origin(self.z, FLOOR_CELL_HEIGHT),
        );
        Aabb::new(
            min,
            min + Vec3::new(FLOOR_CELL_SIZE, FLOOR_CELL_SIZE, FLOOR_CELL_HEIGHT),
        )
    }
}

/// Result of a floor lookup.
///
/// `NoFloor` orders above every real height so "missing" compares as
/// larger than any floor, the way an infinite height would.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum FloorSample {
    /// A floor was found at this height.
    Floor(f32),
    /// The probe found no floor.
    NoFloor,
}

impl FloorSample {
    /// Height of the floor, if any.
    #[must_use]
    pub const fn height(self) -> Option<f32> {
        match self {
            Self::Floor(h) => Some(h),
            Self::NoFloor => None,
        }
    }

    /// True when a floor was found.
    #[must_use]
    pub const fn is_floor(self) -> bool {
        matches!(self, Self::Floor(_))
    }
}

impl From<f32> for FloorSample {
    fn from(height: f32) -> Self {
        Self::Floor(height)
    }
}

impl From<Option<f32>> for FloorSample {
    fn from(height: Option<f32>) -> Self {
        height.map_or(Self::NoFloor, Self::Floor)
    }
}

/// Memo table of floor heights. Never queries physics itself.
#[derive(Debug, Default, Clone)]
pub struct FloorHeightCache {
    cells: HashMap<FloorCellKey, FloorSample>,
}

impl FloorHeightCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every entry.
    pub fn reset(&mut self) {
        self.cells.clear();
    }

    /// Records the floor for the cell containing `position`.
    pub fn set_height(&mut self, position: Vec3, height: impl Into<FloorSample>) {
        self.cells
            .insert(FloorCellKey::from_position(position), height.into());
    }

    /// Cached floor for the cell containing `position`, if any.
    #[must_use]
    pub fn get_height(&self, position: Vec3) -> Option<FloorSample> {
        self.cells.get(&FloorCellKey::from_position(position)).copied()
    }

    /// Centre of the cell containing `position`.
    #[must_use]
    pub fn cell_center(&self, position: Vec3) -> Vec3 {
        self.cell_bounds(position).center()
    }

    /// Bounds of the cell containing `position`.
    #[must_use]
    pub fn cell_bounds(&self, position: Vec3) -> Aabb {
        FloorCellKey::from_position(position).bounds()
    }

    /// Number of cached cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn same_cell_shares_entry() {
        let mut cache = FloorHeightCache::new();
        cache.set_height(Vec3::new(1.1, 1.1, 0.0), 5.0_f32);
        assert_eq!(
            cache.get_height(Vec3::new(1.2, 1.2, 0.0)),
            Some(FloorSample::Floor(5.0))
        );
        assert_eq!(cache.get_height(Vec3::new(1.4, 1.1, 0.0)), None);
    }

    #[rstest]
    fn vertical_bucket_separates_entries() {
        let mut cache = FloorHeightCache::new();
        cache.set_height(Vec3::new(0.1, 0.1, 0.2), 0.0_f32);
        assert!(cache.get_height(Vec3::new(0.1, 0.1, 1.2)).is_none());
    }

    #[rstest]
    fn reset_clears_entries() {
        let mut cache = FloorHeightCache::new();
        cache.set_height(Vec3::ZERO, FloorSample::NoFloor);
        assert_eq!(cache.len(), 1);
        cache.reset();
        assert!(cache.is_empty());
        assert!(cache.get_height(Vec3::ZERO).is_none());
    }

    #[rstest]
    fn overwrite_replaces_height() {
        let mut cache = FloorHeightCache::new();
        cache.set_height(Vec3::ZERO, 1.0_f32);
        cache.set_height(Vec3::ZERO, 1.0_f32);
        cache.set_height(Vec3::new(0.05, 0.05, 0.5), None::<f32>);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_height(Vec3::ZERO), Some(FloorSample::NoFloor));
    }

    #[rstest]
    fn missing_floor_orders_above_any_height() {
        assert!(FloorSample::NoFloor > FloorSample::Floor(f32::MAX));
        assert!(FloorSample::Floor(-3.0) < FloorSample::Floor(2.0));
    }

    #[rstest]
    fn cell_geometry_matches_grid() {
        let cache = FloorHeightCache::new();
        let centre = cache.cell_center(Vec3::new(1.1, -0.1, 2.5));
        assert_relative_eq!(centre.x, 1.125);
        assert_relative_eq!(centre.y, -0.125);
        assert_relative_eq!(centre.z, 2.5);
        let bounds = cache.cell_bounds(Vec3::new(1.1, -0.1, 2.5));
        assert_relative_eq!(bounds.size().x, FLOOR_CELL_SIZE);
        assert_relative_eq!(bounds.size().z, FLOOR_CELL_HEIGHT);
    }
}
