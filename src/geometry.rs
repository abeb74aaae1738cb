//! Axis-aligned boxes and 2D boundary tests used by the walkability caches.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from two corners, ordering them per axis.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a box centred on `centre` with the given half extents.
    #[must_use]
    pub fn from_center(centre: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: centre - half,
            max: centre + half,
        }
    }

    /// True when `min <= max` on every axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Centre point of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full edge lengths of the box.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Box grown by `margin` on each side of each axis.
    #[must_use]
    pub fn expanded(&self, margin: Vec3) -> Self {
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// True when `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.min.cmple(other.min).all()
            && self.max.cmpge(other.max).all()
    }

    /// True when `point` lies inside or on the boundary of the box.
    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.min.cmple(point).all() && self.max.cmpge(point).all()
    }

    /// True when the boxes share any volume or touch.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.min.cmple(other.max).all()
            && self.max.cmpge(other.min).all()
    }

    /// Squared distance from `point` to the closest point of the box.
    #[must_use]
    pub fn distance_squared_to(&self, point: Vec3) -> f32 {
        let clamped = point.clamp(self.min, self.max);
        (point - clamped).length_squared()
    }
}

/// Even-odd test of `point` against the closed polygon `boundary`.
///
/// Polygons with fewer than three vertices contain nothing.
#[must_use]
pub fn point_in_polygon(point: Vec2, boundary: &[Vec2]) -> bool {
    if boundary.len() < 3 {
        return false;
    }
    let mut inside = false;
    let previous = boundary.iter().cycle().skip(boundary.len() - 1);
    for (a, b) in boundary.iter().zip(previous) {
        let crosses = (a.y > point.y) != (b.y > point.y);
        if crosses {
            let x_at = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_at {
                inside = !inside;
            }
        }
    }
    inside
}
