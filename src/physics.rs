//! Boundary with the physics engine.
//!
//! The caches never perform collision work themselves. Everything they know
//! about the world comes through [`PhysicsQuery`], which a host implements on
//! top of its collision engine. Queries are synchronous within a tick.

use std::fmt;
use std::hash::{Hash, Hasher};

use glam::Vec3;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Aabb;

/// Opaque identifier of a physical entity reported by the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u64);

impl From<u64> for ObstacleId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An entity together with its world-space bounding volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Entity identifier.
    pub id: ObstacleId,
    /// World-space bounds of the entity.
    pub bounds: Aabb,
}

impl Obstacle {
    /// Pairs an identifier with its bounds.
    #[must_use]
    pub fn new(id: impl Into<ObstacleId>, bounds: Aabb) -> Self {
        Self {
            id: id.into(),
            bounds,
        }
    }

    /// Feeds the identifier and exact bounds into `state`.
    ///
    /// Floats are hashed through [`OrderedFloat`] so equal bounds always hash
    /// equally, including signed zeros and NaN payloads.
    pub fn hash_contents<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        for v in [self.bounds.min, self.bounds.max] {
            for c in v.to_array() {
                OrderedFloat(c).hash(state);
            }
        }
    }
}

/// Failure reported by the physics collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhysicsError {
    /// The physics world is not available this tick.
    #[error("physics world unavailable")]
    Unavailable,
    /// The backend rejected or aborted the query.
    #[error("physics query failed: {0}")]
    Backend(String),
}

/// Geometric queries the caches delegate to the host's collision engine.
pub trait PhysicsQuery {
    /// Returns every entity whose bounds overlap `region`.
    ///
    /// # Errors
    /// Returns [`PhysicsError`] when the backend cannot answer.
    fn overlap(&self, region: &Aabb) -> Result<Vec<Obstacle>, PhysicsError>;

    /// Finds the highest floor below `position` within `search_height`,
    /// considering only `candidates`.
    ///
    /// The search covers a vertical column of `search_radius` around the
    /// probe, from `position.z` down to `position.z - search_height`.
    fn find_floor(
        &self,
        position: Vec3,
        search_radius: f32,
        search_height: f32,
        candidates: &[Obstacle],
    ) -> Option<f32>;

    /// True when a capsule swept from `start` to `end` with `radius` touches
    /// any of `candidates`.
    fn capsule_overlaps(&self, start: Vec3, end: Vec3, radius: f32, candidates: &[Obstacle]) -> bool;
}

impl<P: PhysicsQuery + ?Sized> PhysicsQuery for &P {
    fn overlap(&self, region: &Aabb) -> Result<Vec<Obstacle>, PhysicsError> {
        (**self).overlap(region)
    }

    fn find_floor(
        &self,
        position: Vec3,
        search_radius: f32,
        search_height: f32,
        candidates: &[Obstacle],
    ) -> Option<f32> {
        (**self).find_floor(position, search_radius, search_height, candidates)
    }

    fn capsule_overlaps(&self, start: Vec3, end: Vec3, radius: f32, candidates: &[Obstacle]) -> bool {
        (**self).capsule_overlaps(start, end, radius, candidates)
    }
}
