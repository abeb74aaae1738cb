//! Shared fixtures for the integration tests: a box-world physics fake and
//! path builders.

pub mod paths;
pub mod physics;

pub use paths::{corner_path, straight_path, tagged_path};
pub use physics::BoxWorld;

use strider::WalkabilityReport;

/// Assert that two walkability reports agree on every observable field.
///
/// # Panics
/// Panics when the walkable flag or flatness differ, or when the final
/// floors differ by more than `1e-4`.
pub fn assert_reports_agree(cached: &WalkabilityReport, uncached: &WalkabilityReport) {
    assert_eq!(cached.walkable, uncached.walkable, "walkable flags differ");
    assert_eq!(cached.flat_floor, uncached.flat_floor, "flatness differs");
    match (cached.final_floor, uncached.final_floor) {
        (Some(a), Some(b)) => assert!((a - b).abs() <= 1e-4, "floors differ: {a} vs {b}"),
        (a, b) => assert_eq!(a, b, "final floors differ"),
    }
}
