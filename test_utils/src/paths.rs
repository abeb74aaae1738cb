//! Path builders shared by the follower tests.

use glam::Vec3;
use strider::{NavigationType, PathHandle, PathPoint};

/// Straight path along +X from the origin, `length` long, with a control
/// point every `spacing` units.
pub fn straight_path(length: f32, spacing: f32) -> PathHandle {
    let count = (length / spacing).ceil().max(1.0) as u32;
    PathHandle::from_points(
        (0..=count).map(|i| Vec3::new((i as f32 * spacing).min(length), 0.0, 0.0)),
    )
}

/// L-shaped path: `leg` along +X, then `leg` along +Y.
pub fn corner_path(leg: f32) -> PathHandle {
    PathHandle::from_points([Vec3::ZERO, Vec3::new(leg, 0.0, 0.0), Vec3::new(leg, leg, 0.0)])
}

/// Straight 30 unit path whose third point enters a road and whose fourth
/// is a smart-object link.
pub fn tagged_path() -> PathHandle {
    PathHandle::from_points([
        PathPoint::new(Vec3::ZERO),
        PathPoint::new(Vec3::new(10.0, 0.0, 0.0)),
        PathPoint::new(Vec3::new(20.0, 0.0, 0.0)).with_navigation_type(NavigationType::Road),
        PathPoint::new(Vec3::new(25.0, 0.0, 0.0))
            .with_navigation_type(NavigationType::SmartObject)
            .with_custom_id(7),
        PathPoint::new(Vec3::new(30.0, 0.0, 0.0)),
    ])
}
