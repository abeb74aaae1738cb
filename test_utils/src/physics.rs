//! A physics collaborator made of axis-aligned boxes.

use std::cell::Cell;

use glam::Vec3;
use strider::{Aabb, Obstacle, PhysicsError, PhysicsQuery};

/// Boxes standing in for level geometry. The top face of every box is a
/// floor; every box blocks a torso sweep.
///
/// Counts the queries it answers so tests can tell cached from uncached
/// behaviour.
#[derive(Debug, Default)]
pub struct BoxWorld {
    obstacles: Vec<Obstacle>,
    next_id: u64,
    failing: bool,
    overlap_calls: Cell<usize>,
    floor_calls: Cell<usize>,
    sweep_calls: Cell<usize>,
}

impl BoxWorld {
    /// Empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// World with a 100 m square ground slab whose top is at `z = 0`.
    ///
    /// # Examples
    /// ```
    /// use test_utils::BoxWorld;
    /// let world = BoxWorld::with_ground();
    /// assert_eq!(world.obstacles().len(), 1);
    /// ```
    pub fn with_ground() -> Self {
        let mut world = Self::new();
        world.add_box(Vec3::new(-50.0, -50.0, -1.0), Vec3::new(50.0, 50.0, 0.0));
        world
    }

    /// Adds a box spanning `min..max` and returns its obstacle.
    pub fn add_box(&mut self, min: Vec3, max: Vec3) -> Obstacle {
        self.next_id += 1;
        let obstacle = Obstacle::new(self.next_id, Aabb::new(min, max));
        self.obstacles.push(obstacle);
        obstacle
    }

    /// Adds a pillar of `half_width` footprint rising `height` above `base`.
    pub fn add_pillar(&mut self, base: Vec3, half_width: f32, height: f32) -> Obstacle {
        self.add_box(
            base - Vec3::new(half_width, half_width, 0.0),
            base + Vec3::new(half_width, half_width, height),
        )
    }

    /// Adds a raised platform whose top sits at `top`.
    pub fn add_platform(&mut self, min_xy: (f32, f32), max_xy: (f32, f32), top: f32) -> Obstacle {
        self.add_box(
            Vec3::new(min_xy.0, min_xy.1, top - 0.5),
            Vec3::new(max_xy.0, max_xy.1, top),
        )
    }

    /// Every obstacle in insertion order.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Makes every later overlap query fail.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Overlap queries answered so far, failed ones included.
    pub fn overlap_calls(&self) -> usize {
        self.overlap_calls.get()
    }

    /// Floor probes answered so far.
    pub fn floor_calls(&self) -> usize {
        self.floor_calls.get()
    }

    /// Capsule sweeps answered so far.
    pub fn sweep_calls(&self) -> usize {
        self.sweep_calls.get()
    }

    /// Zeroes the call counters.
    pub fn reset_counters(&self) {
        self.overlap_calls.set(0);
        self.floor_calls.set(0);
        self.sweep_calls.set(0);
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl PhysicsQuery for BoxWorld {
    fn overlap(&self, region: &Aabb) -> Result<Vec<Obstacle>, PhysicsError> {
        bump(&self.overlap_calls);
        if self.failing {
            return Err(PhysicsError::Backend("box world switched off".into()));
        }
        Ok(self
            .obstacles
            .iter()
            .filter(|obstacle| obstacle.bounds.intersects(region))
            .copied()
            .collect())
    }

    fn find_floor(
        &self,
        position: Vec3,
        search_radius: f32,
        search_height: f32,
        candidates: &[Obstacle],
    ) -> Option<f32> {
        bump(&self.floor_calls);
        let column = Aabb::new(
            position - Vec3::new(search_radius, search_radius, search_height),
            position + Vec3::new(search_radius, search_radius, 0.0),
        );
        candidates
            .iter()
            .map(|obstacle| obstacle.bounds)
            .filter(|bounds| bounds.intersects(&column))
            .map(|bounds| bounds.max.z)
            .filter(|top| *top <= position.z && *top >= column.min.z)
            .reduce(f32::max)
    }

    fn capsule_overlaps(&self, start: Vec3, end: Vec3, radius: f32, candidates: &[Obstacle]) -> bool {
        bump(&self.sweep_calls);
        let samples = strider::numeric::step_count(start.distance(end), (radius * 0.5).max(0.01)).unwrap_or(1);
        candidates.iter().any(|obstacle| {
            (0..=samples).any(|i| {
                let point = start.lerp(end, i as f32 / samples as f32);
                obstacle.bounds.distance_squared_to(point) <= radius * radius
            })
        })
    }
}
