//! Minimal physics collaborator for unit tests: a list of boxes whose tops
//! are floors, with call counters.

use std::cell::Cell;

use glam::Vec3;

use crate::geometry::Aabb;
use crate::physics::{Obstacle, PhysicsError, PhysicsQuery};

pub(crate) struct Slabs {
    pub(crate) boxes: Vec<Obstacle>,
    pub(crate) overlaps: Cell<usize>,
    pub(crate) floors: Cell<usize>,
    pub(crate) fail: bool,
}

impl Slabs {
    pub(crate) fn new(boxes: Vec<Obstacle>) -> Self {
        Self {
            boxes,
            overlaps: Cell::new(0),
            floors: Cell::new(0),
            fail: false,
        }
    }
}

impl PhysicsQuery for Slabs {
    fn overlap(&self, region: &Aabb) -> Result<Vec<Obstacle>, PhysicsError> {
        self.overlaps.set(self.overlaps.get() + 1);
        if self.fail {
            return Err(PhysicsError::Unavailable);
        }
        Ok(self
            .boxes
            .iter()
            .filter(|o| o.bounds.intersects(region))
            .copied()
            .collect())
    }

    fn find_floor(&self, position: Vec3, radius: f32, height: f32, candidates: &[Obstacle]) -> Option<f32> {
        self.floors.set(self.floors.get() + 1);
        candidates
            .iter()
            .filter(|o| {
                o.bounds.min.x <= position.x + radius
                    && o.bounds.max.x >= position.x - radius
                    && o.bounds.min.y <= position.y + radius
                    && o.bounds.max.y >= position.y - radius
            })
            .map(|o| o.bounds.max.z)
            .filter(|&top| top <= position.z && top >= position.z - height)
            .reduce(f32::max)
    }

    fn capsule_overlaps(&self, start: Vec3, end: Vec3, radius: f32, candidates: &[Obstacle]) -> bool {
        candidates.iter().any(|o| {
            (0_u8..=8).any(|i| {
                let p = start.lerp(end, f32::from(i) / 8.0);
                o.bounds.distance_squared_to(p) <= radius * radius
            })
        })
    }
}

/// Fifty-metre ground slab with its top at z = 0.
pub(crate) fn ground() -> Obstacle {
    Obstacle::new(
        1,
        Aabb::new(Vec3::new(-50.0, -50.0, -1.0), Vec3::new(50.0, 50.0, 0.0)),
    )
}
