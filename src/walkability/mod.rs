//! Walkability queries and the per-actor caches that make them cheap.
//!
//! A walk from `origin` to `target` is sampled in horizontal steps no longer
//! than the agent radius. Every sample needs a floor reachable from the
//! previous one and a clear torso sweep between the two. The same stepping
//! runs against a [`WalkabilityCache`] or straight against the physics
//! collaborator, so cached and uncached answers agree.

mod cache;
mod manager;
mod pool;
mod stats;
#[cfg(test)]
mod test_world;

pub use cache::{CacheOutcome, WalkabilityCache};
pub use manager::{ActorKey, ActorWalkability, WalkabilityCacheManager};
pub use pool::{CacheHandle, CachePool};
pub use stats::WalkabilityStats;

use glam::{Vec2, Vec3};
use log::trace;

use crate::config::WalkabilityConfig;
use crate::geometry::{point_in_polygon, Aabb};
use crate::numeric::{count_to_f32, step_count};
use crate::physics::{Obstacle, PhysicsQuery};
use crate::vector_math::horizontal;

/// Outcome of a walkability check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkabilityReport {
    /// True when the whole segment can be walked.
    pub walkable: bool,
    /// Floor height under the last sample, when the walk succeeded.
    pub final_floor: Option<f32>,
    /// True when consecutive floor samples never differed by more than the
    /// flat-floor tolerance. Distinguishes ramps from steps and ledges.
    pub flat_floor: bool,
}

impl WalkabilityReport {
    /// Report for a walk that failed or could not be evaluated.
    pub const BLOCKED: Self = Self {
        walkable: false,
        final_floor: None,
        flat_floor: false,
    };
}

/// Collaborator answering "can an agent of `radius` walk from `from` to `to`".
pub trait WalkabilityOracle {
    /// True when the straight segment is walkable.
    fn can_walk(&mut self, from: Vec3, to: Vec3, radius: f32) -> bool;
}

/// Region that must be cached to evaluate a walk between two points.
#[must_use]
pub fn walk_region(origin: Vec3, target: Vec3, radius: f32, config: &WalkabilityConfig) -> Aabb {
    let horizontal_margin = radius + config.floor_probe_radius;
    let base = Aabb::new(origin, target);
    Aabb::new(
        base.min - Vec3::new(horizontal_margin, horizontal_margin, config.floor_search_down),
        base.max
            + Vec3::new(
                horizontal_margin,
                horizontal_margin,
                config.floor_search_up + config.torso_offset + 2.0 * radius,
            ),
    )
}

/// Region a floor probe at `position` may touch.
#[must_use]
pub fn floor_probe_region(position: Vec3, config: &WalkabilityConfig) -> Aabb {
    let r = config.floor_probe_radius;
    Aabb::new(
        position - Vec3::new(r, r, config.floor_search_down),
        position + Vec3::new(r, r, config.floor_search_up),
    )
}

/// Evaluates a walk straight against the physics collaborator.
///
/// This is the slow path used when no cache is available. It issues one
/// overlap query for the walk region, and another whenever the floor drops
/// far enough that a probe reaches below it. Floors are not memoised.
/// A failing physics query yields [`WalkabilityReport::BLOCKED`].
#[must_use]
pub fn check_walkability_uncached<P: PhysicsQuery + ?Sized>(
    physics: &P,
    config: &WalkabilityConfig,
    origin: Vec3,
    target: Vec3,
    radius: f32,
    boundary: Option<&[Vec2]>,
) -> WalkabilityReport {
    let region = walk_region(origin, target, radius, config);
    let candidates = match physics.overlap(&region) {
        Ok(found) => found,
        Err(err) => {
            trace!("uncached walkability query failed: {err}");
            return WalkabilityReport::BLOCKED;
        }
    };
    let mut surface = DirectSurface {
        physics,
        config,
        covered: region,
        candidates,
    };
    walk(&mut surface, config, origin, target, radius, boundary)
}

/// Probes the floor under `position` straight against physics.
#[must_use]
pub fn find_floor_uncached<P: PhysicsQuery + ?Sized>(
    physics: &P,
    config: &WalkabilityConfig,
    position: Vec3,
) -> Option<f32> {
    let candidates = physics.overlap(&floor_probe_region(position, config)).ok()?;
    probe_floor(physics, config, position, &candidates)
}

pub(crate) fn probe_floor<P: PhysicsQuery + ?Sized>(
    physics: &P,
    config: &WalkabilityConfig,
    position: Vec3,
    candidates: &[Obstacle],
) -> Option<f32> {
    let start = position + Vec3::Z * config.floor_search_up;
    physics.find_floor(
        start,
        config.floor_probe_radius,
        config.floor_search_up + config.floor_search_down,
        candidates,
    )
}

/// Floor and obstacle source a walk is evaluated against.
pub(crate) trait WalkSurface {
    fn floor_at(&mut self, probe: Vec3) -> Option<f32>;
    fn torso_blocked(&mut self, start: Vec3, end: Vec3, radius: f32) -> bool;
}

/// Walk surface straight over physics. `candidates` holds everything
/// overlapping `covered`, which grows when a floor probe reaches past it.
struct DirectSurface<'a, P: ?Sized> {
    physics: &'a P,
    config: &'a WalkabilityConfig,
    covered: Aabb,
    candidates: Vec<Obstacle>,
}

impl<P: PhysicsQuery + ?Sized> WalkSurface for DirectSurface<'_, P> {
    fn floor_at(&mut self, probe: Vec3) -> Option<f32> {
        let column = floor_probe_region(probe, self.config);
        if !self.covered.contains(&column) {
            let grown = self.covered.union(&column);
            match self.physics.overlap(&grown) {
                Ok(found) => {
                    self.candidates = found;
                    self.covered = grown;
                }
                Err(err) => {
                    trace!("uncached floor query failed: {err}");
                    return None;
                }
            }
        }
        probe_floor(self.physics, self.config, probe, &self.candidates)
    }

    fn torso_blocked(&mut self, start: Vec3, end: Vec3, radius: f32) -> bool {
        self.physics
            .capsule_overlaps(start, end, radius, &self.candidates)
    }
}

fn inside_boundary(point: Vec3, boundary: Option<&[Vec2]>) -> bool {
    boundary.is_none_or(|polygon| point_in_polygon(horizontal(point), polygon))
}

pub(crate) fn walk<S: WalkSurface>(
    surface: &mut S,
    config: &WalkabilityConfig,
    origin: Vec3,
    target: Vec3,
    radius: f32,
    boundary: Option<&[Vec2]>,
) -> WalkabilityReport {
    if !inside_boundary(origin, boundary) {
        return WalkabilityReport::BLOCKED;
    }
    let Some(mut floor) = surface.floor_at(origin) else {
        return WalkabilityReport::BLOCKED;
    };

    let start = horizontal(origin);
    let delta = horizontal(target) - start;
    let Some(steps) = step_count(delta.length(), radius) else {
        return WalkabilityReport::BLOCKED;
    };
    let lift = Vec3::Z * (config.torso_offset + radius);
    let mut previous = Vec3::new(origin.x, origin.y, floor);
    let mut flat = true;

    for step in 1..=steps {
        let xy = start + delta * (count_to_f32(step) / count_to_f32(steps));
        let probe = Vec3::new(xy.x, xy.y, floor);
        if !inside_boundary(probe, boundary) {
            return WalkabilityReport::BLOCKED;
        }
        let Some(next_floor) = surface.floor_at(probe) else {
            return WalkabilityReport::BLOCKED;
        };
        if (next_floor - floor).abs() > config.flat_floor_tolerance {
            flat = false;
        }
        let sample = Vec3::new(xy.x, xy.y, next_floor);
        if surface.torso_blocked(previous + lift, sample + lift, radius) {
            return WalkabilityReport::BLOCKED;
        }
        previous = sample;
        floor = next_floor;
    }

    WalkabilityReport {
        walkable: true,
        final_floor: Some(floor),
        flat_floor: flat,
    }
}
