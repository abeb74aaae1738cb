//! Fixed grid and tolerance constants shared by the caches and the follower.
//!
//! Values that a host might reasonably tune live in
//! [`crate::config`]; the constants here define cache granularity and
//! numeric guards that other components rely on being stable.

/// Horizontal edge length of a floor cache cell.
pub const FLOOR_CELL_SIZE: f32 = 0.25;
/// Vertical extent of a floor cache cell. Only used to key entries.
pub const FLOOR_CELL_HEIGHT: f32 = 1.0;
/// Default upper bound on obstacles retained by a single walkability cache.
pub const DEFAULT_OBSTACLE_CAPACITY: usize = 768;
/// Default number of walkability caches the manager pool may hand out.
pub const DEFAULT_POOL_CAPACITY: usize = 256;
/// Frames a cache may stay unqueried before the manager evicts it.
pub const DEFAULT_RETENTION_FRAMES: u64 = 4;
/// Distance above the probe point where floor searches begin.
pub const FLOOR_SEARCH_UP: f32 = 0.25;
/// Distance below the probe point where floor searches end.
pub const FLOOR_SEARCH_DOWN: f32 = 2.0;
/// Horizontal radius used when probing for floor.
pub const FLOOR_PROBE_RADIUS: f32 = 0.06;
/// Height of the torso sweep base above the floor.
pub const TORSO_OFFSET: f32 = 0.65;
/// Floor height delta below which consecutive samples count as flat.
pub const FLAT_FLOOR_TOLERANCE: f32 = 0.05;
/// Lengths shorter than this are treated as zero by geometric helpers.
pub const GEOMETRY_EPSILON: f32 = 1e-5;
