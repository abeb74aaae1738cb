//! Vector helpers honouring the planar (2D) distance mode.
//!
//! Path progress and walkability radius checks can ignore the vertical axis
//! so floor height noise never makes an agent look "off path".
use glam::{Vec2, Vec3};

/// Drops the vertical component of `v` when `planar` is set.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use strider::vector_math::flatten;
/// assert_eq!(flatten(Vec3::new(1.0, 2.0, 3.0), true), Vec3::new(1.0, 2.0, 0.0));
/// assert_eq!(flatten(Vec3::new(1.0, 2.0, 3.0), false), Vec3::new(1.0, 2.0, 3.0));
/// ```
#[must_use]
pub const fn flatten(v: Vec3, planar: bool) -> Vec3 {
    if planar {
        Vec3::new(v.x, v.y, 0.0)
    } else {
        v
    }
}

/// Distance between `a` and `b`, ignoring height when `planar` is set.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use strider::vector_math::distance;
/// let a = Vec3::new(0.0, 0.0, 0.0);
/// let b = Vec3::new(3.0, 4.0, 12.0);
/// assert!((distance(a, b, false) - 13.0).abs() < f32::EPSILON);
/// assert!((distance(a, b, true) - 5.0).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn distance(a: Vec3, b: Vec3, planar: bool) -> f32 {
    flatten(b - a, planar).length()
}

/// Returns the unit vector along `v`, or zero for degenerate input.
#[must_use]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    if !v.is_finite() {
        return Vec3::ZERO;
    }
    v.try_normalize().unwrap_or(Vec3::ZERO)
}

/// Horizontal projection of a world position.
#[must_use]
pub const fn horizontal(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Parameter of the point on segment `a..b` closest to `p`, clamped to
/// `[0, 1]`. Degenerate segments return `0`.
#[must_use]
pub fn closest_fraction_on_segment(a: Vec3, b: Vec3, p: Vec3, planar: bool) -> f32 {
    let ab = flatten(b - a, planar);
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return 0.0;
    }
    (flatten(p - a, planar).dot(ab) / len_sq).clamp(0.0, 1.0)
}

/// Larger root `t` where the ray `a + t * (b - a)` leaves the sphere of
/// `radius` around `centre`.
///
/// Returns `None` when the segment is degenerate or never touches the
/// sphere. The root may exceed `1` when `b` lies inside the sphere.
#[must_use]
pub fn sphere_exit_fraction(a: Vec3, b: Vec3, centre: Vec3, radius: f32, planar: bool) -> Option<f32> {
    let d = flatten(b - a, planar);
    let f = flatten(a - centre, planar);
    let qa = d.length_squared();
    if qa <= f32::EPSILON {
        return None;
    }
    let qb = 2.0 * f.dot(d);
    let qc = f.length_squared() - radius * radius;
    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant < 0.0 {
        return None;
    }
    Some((-qb + discriminant.sqrt()) / (2.0 * qa))
}
