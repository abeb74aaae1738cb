//! Path data shared between the path provider and the follower.

use std::sync::{Arc, PoisonError, RwLock};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::vector_math::normalize_or_zero;

/// Terrain or graph layer a path point lies on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationType {
    /// Not annotated.
    #[default]
    Unset,
    /// Triangulated ground mesh.
    Triangular,
    /// Hand-placed waypoint graph.
    Waypoint,
    /// Free flight.
    Flight,
    /// Volumetric navigation.
    Volume,
    /// Road network.
    Road,
    /// Link through a smart object.
    SmartObject,
    /// Unconstrained 2D movement.
    Free2d,
    /// Project-specific navigation layer.
    CustomNavigation,
}

/// Raw waypoint as produced by the path provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    /// Layer the point lies on.
    pub navigation_type: NavigationType,
    /// Point on the raw path.
    pub position: Vec3,
    /// Direction of the lateral offset.
    pub offset_direction: Vec3,
    /// Offset amount in `0..=1`, scaled by the follower's path radius.
    pub offset_amount: f32,
    /// Opaque tag; present on smart-object links.
    pub custom_id: Option<u32>,
}

impl PathPoint {
    /// Plain waypoint with no offset.
    #[must_use]
    pub const fn new(position: Vec3) -> Self {
        Self {
            navigation_type: NavigationType::Unset,
            position,
            offset_direction: Vec3::ZERO,
            offset_amount: 0.0,
            custom_id: None,
        }
    }

    /// Sets the navigation type.
    #[must_use]
    pub const fn with_navigation_type(mut self, navigation_type: NavigationType) -> Self {
        self.navigation_type = navigation_type;
        self
    }

    /// Sets the lateral offset.
    #[must_use]
    pub const fn with_offset(mut self, direction: Vec3, amount: f32) -> Self {
        self.offset_direction = direction;
        self.offset_amount = amount;
        self
    }

    /// Tags the point with a custom id.
    #[must_use]
    pub const fn with_custom_id(mut self, id: u32) -> Self {
        self.custom_id = Some(id);
        self
    }
}

impl From<Vec3> for PathPoint {
    fn from(position: Vec3) -> Self {
        Self::new(position)
    }
}

/// Ordered waypoints plus a version bumped on every mutation.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPath {
    points: Vec<PathPoint>,
    version: u32,
}

impl NavPath {
    /// Creates a path at version zero.
    #[must_use]
    pub fn new(points: impl IntoIterator<Item = impl Into<PathPoint>>) -> Self {
        Self {
            points: points.into_iter().map(Into::into).collect(),
            version: 0,
        }
    }

    /// Waypoints in path order.
    #[must_use]
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    /// Current version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Mutates the waypoints and bumps the version.
    pub fn modify<R>(&mut self, f: impl FnOnce(&mut Vec<PathPoint>) -> R) -> R {
        let out = f(&mut self.points);
        self.version = self.version.wrapping_add(1);
        out
    }
}

/// Shared handle to a [`NavPath`] owned by the path provider.
#[derive(Debug, Clone, Default)]
pub struct PathHandle(Arc<RwLock<NavPath>>);

impl PathHandle {
    /// Wraps a path.
    #[must_use]
    pub fn new(path: NavPath) -> Self {
        Self(Arc::new(RwLock::new(path)))
    }

    /// Builds a handle straight from positions.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = impl Into<PathPoint>>) -> Self {
        Self::new(NavPath::new(points))
    }

    /// Runs `f` against the current path.
    #[must_use]
    pub fn read<R>(&self, f: impl FnOnce(&NavPath) -> R) -> R {
        let guard = self.0.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Mutates the waypoints, bumping the version.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Vec<PathPoint>) -> R) -> R {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        guard.modify(f)
    }

    /// Current version of the path.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.read(NavPath::version)
    }

    /// True when both handles share the same path.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Waypoint after the lateral offset has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathControlPoint {
    /// Layer the point lies on.
    pub navigation_type: NavigationType,
    /// Point actually followed.
    pub position: Vec3,
    /// Point on the raw path.
    pub raw_position: Vec3,
    /// Direction of the lateral offset.
    pub offset_direction: Vec3,
    /// Offset amount in `0..=1`.
    pub offset_amount: f32,
    /// Opaque tag; present on smart-object links.
    pub custom_id: Option<u32>,
}

impl PathControlPoint {
    /// Derives the followed point from a raw waypoint.
    #[must_use]
    pub fn from_path_point(point: &PathPoint, path_radius: f32) -> Self {
        let mut control = Self {
            navigation_type: point.navigation_type,
            position: point.position,
            raw_position: point.position,
            offset_direction: point.offset_direction,
            offset_amount: point.offset_amount,
            custom_id: point.custom_id,
        };
        control.apply_radius(path_radius);
        control
    }

    /// Recomputes [`Self::position`] for a new path radius.
    pub fn apply_radius(&mut self, path_radius: f32) {
        let amount = self.offset_amount.clamp(0.0, 1.0);
        self.position =
            self.raw_position + normalize_or_zero(self.offset_direction) * amount * path_radius;
    }

    /// True when the point is a smart-object link.
    #[must_use]
    pub const fn is_smart_object(&self) -> bool {
        self.custom_id.is_some()
    }
}

/// Distance along the path to some feature.
///
/// `Unreachable` orders above every finite distance.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum PathDistance {
    /// The feature lies this far ahead.
    Finite(f32),
    /// The feature does not appear on the rest of the path.
    Unreachable,
}

impl PathDistance {
    /// Distance, if reachable.
    #[must_use]
    pub const fn value(self) -> Option<f32> {
        match self {
            Self::Finite(d) => Some(d),
            Self::Unreachable => None,
        }
    }

    /// True for [`Self::Finite`].
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        matches!(self, Self::Finite(_))
    }
}
